//! Math types shared across the toolkit.
//!
//! Re-exports the SIMD-backed [`glam`] vector types used for pointer
//! positions.
//!
//! ```
//! use kestrel_core::math::Vec2;
//!
//! let pointer = Vec2::new(10.0, 20.0);
//! assert_eq!(pointer + Vec2::ONE, Vec2::new(11.0, 21.0));
//! ```

pub use glam::{Vec2, vec2};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_helper() {
        assert_eq!(vec2(3.0, 4.0), Vec2::new(3.0, 4.0));
        assert_eq!(Vec2::ZERO.length(), 0.0);
    }
}
