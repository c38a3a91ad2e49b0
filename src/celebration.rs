use rand::{seq::SliceRandom, Rng};

const SPARK_SYMBOLS: [char; 6] = ['*', '+', '✦', '✧', '·', '★'];
const SPARK_COUNT: usize = 28;
const GRAVITY: f64 = 9.0;

/// One spark of the new-best burst.
#[derive(Debug, Clone)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl Spark {
    fn new<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let speed = rng.gen_range(4.0..12.0);
        Self {
            x,
            y,
            // Terminal cells are roughly twice as tall as wide.
            vel_x: angle.cos() * speed * 2.0,
            vel_y: angle.sin() * speed,
            symbol: *SPARK_SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            age: 0.0,
            max_age: rng.gen_range(0.8..1.6),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
        self.age += dt;
        self.age < self.max_age
    }

    /// 1.0 when fresh, 0.0 when about to disappear.
    pub fn life_left(&self) -> f64 {
        (1.0 - self.age / self.max_age).clamp(0.0, 1.0)
    }
}

/// Sparks thrown out from the best-value panel when a new best is caught.
#[derive(Debug, Default)]
pub struct Celebration {
    pub sparks: Vec<Spark>,
    pub is_active: bool,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Burst from `(x, y)` inside a `width` x `height` area.
    pub fn start(&mut self, x: u16, y: u16, width: u16, height: u16) {
        self.start_with_rng(x, y, width, height, &mut rand::thread_rng());
    }

    pub fn start_with_rng<R: Rng>(&mut self, x: u16, y: u16, width: u16, height: u16, rng: &mut R) {
        self.width = width as f64;
        self.height = height as f64;
        self.sparks = (0..SPARK_COUNT)
            .map(|_| Spark::new(x as f64, y as f64, rng))
            .collect();
        self.is_active = true;
    }

    pub fn stop(&mut self) {
        self.sparks.clear();
        self.is_active = false;
    }

    /// Advance the animation by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }
        let (width, height) = (self.width, self.height);
        self.sparks.retain_mut(|spark| {
            let alive = spark.update(dt);
            let on_screen = spark.x >= 0.0 && spark.x < width && spark.y >= 0.0 && spark.y < height;
            alive && on_screen
        });
        if self.sparks.is_empty() {
            self.is_active = false;
        }
    }
}
