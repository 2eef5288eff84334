/// Source of uniform random draws for the behavior state machine.
///
/// The controller only ever needs `[0, 1)` values; durations, headings and
/// speeds are derived from them. Abstracting the source lets tests script an
/// exact sequence of draws and assert exact transition outcomes.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

impl RandomSource for fastrand::Rng {
    fn next_f64(&mut self) -> f64 {
        self.f64()
    }
}

#[cfg(test)]
pub mod testing {
    use super::RandomSource;
    use std::collections::VecDeque;

    /// Replays a fixed sequence of draws, then repeats the last one.
    pub struct ScriptedRandom {
        draws: VecDeque<f64>,
        last: f64,
    }

    impl ScriptedRandom {
        pub fn new(draws: &[f64]) -> Self {
            Self {
                draws: draws.iter().copied().collect(),
                last: 0.0,
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn next_f64(&mut self) -> f64 {
            if let Some(v) = self.draws.pop_front() {
                self.last = v;
            }
            self.last
        }
    }
}
