//! Minimal SVG path grammar: `M x,y`, `L x,y`, `Z`

use std::fmt::Write;

use glam::DVec2;

/// Append `x,y` in shortest round-trip form
#[inline]
pub(crate) fn push_point(out: &mut String, p: DVec2) {
    // Writing into a String cannot fail
    let _ = write!(out, "{},{}", p.x, p.y);
}

/// Append one closed loop `M p0 L p1 ... Z`; no-op for an empty slice
pub(crate) fn push_loop(out: &mut String, points: &[DVec2]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str("M ");
    push_point(out, *first);
    for p in rest {
        out.push_str(" L ");
        push_point(out, *p);
    }
    out.push_str(" Z");
}

/// Path of a single closed polygon
pub fn polygon_path(points: &[DVec2]) -> String {
    let mut out = String::new();
    push_loop(&mut out, points);
    out
}

/// Count the `M ... Z` loops in a path string
pub fn loop_count(path: &str) -> usize {
    path.split_whitespace().filter(|token| *token == "M").count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_path() {
        let path = polygon_path(&[
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 5.5),
        ]);
        assert_eq!(path, "M 0,0 L 10,0 L 10,5.5 Z");
        assert_eq!(loop_count(&path), 1);
    }

    #[test]
    fn test_coordinates_are_exact() {
        let a = DVec2::new(1.0 / 3.0, 200.000_001);
        let b = DVec2::new(1.0 / 3.0 + 1e-4, 200.000_002);
        let path = polygon_path(&[a, b, DVec2::ZERO]);

        let parsed: Vec<DVec2> = path
            .split_whitespace()
            .filter(|token| token.contains(','))
            .map(|token| {
                let (x, y) = token.split_once(',').unwrap();
                DVec2::new(x.parse().unwrap(), y.parse().unwrap())
            })
            .collect();
        assert_eq!(parsed, vec![a, b, DVec2::ZERO]);
    }

    #[test]
    fn test_loops_are_space_joined() {
        let mut out = String::new();
        push_loop(&mut out, &[DVec2::ZERO, DVec2::X, DVec2::Y]);
        push_loop(&mut out, &[DVec2::ONE, DVec2::new(2.0, 1.0), DVec2::new(2.0, 2.0)]);
        assert!(out.contains("Z M"));
        assert_eq!(loop_count(&out), 2);
    }

    #[test]
    fn test_empty_loop_is_noop() {
        assert_eq!(polygon_path(&[]), "");
    }
}
