/// Quadrature steps per mechanical detent.
const STEPS_PER_DETENT: i8 = 4;

/// Direction of each (previous, current) A/B transition. Invalid double
/// transitions count as zero.
const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Quadrature decoder with an absolute position that wraps within
/// `0..span`, one step per detent.
#[derive(Debug, Clone)]
pub struct RotaryEncoder {
    last_ab: u8,
    steps: i8,
    position: i32,
    span: i32,
}

impl RotaryEncoder {
    pub fn new(span: usize, initial: i32) -> Self {
        let span = span.max(1) as i32;
        Self {
            last_ab: 0,
            steps: 0,
            position: initial.rem_euclid(span),
            span,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// Move the dial without emitting an event, e.g. after the wake path
    /// reset the active screen.
    pub fn set_position(&mut self, position: i32) {
        self.position = position.rem_euclid(self.span);
        self.steps = 0;
    }

    /// Feed the current A/B levels. Returns the new position once a full
    /// detent has been turned.
    pub fn update(&mut self, a: bool, b: bool) -> Option<i32> {
        let ab = ((a as u8) << 1) | b as u8;
        if ab == self.last_ab {
            return None;
        }

        self.steps += TRANSITIONS[((self.last_ab << 2) | ab) as usize];
        self.last_ab = ab;

        let delta = if self.steps >= STEPS_PER_DETENT {
            1
        } else if self.steps <= -STEPS_PER_DETENT {
            -1
        } else {
            return None;
        };

        self.steps = 0;
        self.position = (self.position + delta).rem_euclid(self.span);
        Some(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCKWISE: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];

    fn turn(encoder: &mut RotaryEncoder, clockwise: bool) -> Option<i32> {
        let mut last = None;
        let mut sequence = CLOCKWISE;
        if !clockwise {
            sequence = [(false, true), (true, true), (true, false), (false, false)];
        }
        for (a, b) in sequence {
            last = encoder.update(a, b);
        }
        last
    }

    #[test]
    fn test_one_detent_moves_one_position() {
        let mut encoder = RotaryEncoder::new(8, 0);
        assert_eq!(turn(&mut encoder, true), Some(1));
        assert_eq!(turn(&mut encoder, false), Some(0));
    }

    #[test]
    fn test_position_wraps_both_ways() {
        let mut encoder = RotaryEncoder::new(8, 7);
        assert_eq!(turn(&mut encoder, true), Some(0));
        assert_eq!(turn(&mut encoder, false), Some(7));
    }

    #[test]
    fn test_bounce_on_one_line_cancels_out() {
        let mut encoder = RotaryEncoder::new(8, 3);
        for _ in 0..10 {
            assert_eq!(encoder.update(true, false), None);
            assert_eq!(encoder.update(false, false), None);
        }
        assert_eq!(encoder.position(), 3);
    }
}
