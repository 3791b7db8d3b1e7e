use svgtypes::{TransformListParser, TransformListToken};

use crate::Error;

/// SVG affine transform `(a b c d e f)`, mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Matrix { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Matrix::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotate(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Matrix::new(c, s, -s, c, 0.0, 0.0)
    }

    pub fn skew_x(degrees: f64) -> Self {
        Matrix::new(1.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(degrees: f64) -> Self {
        Matrix::new(1.0, degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Matrix product `self * other`; `other` is applied to the point first.
    /// Folding a transform list left-to-right with this reproduces SVG
    /// `transform="A B C"` semantics.
    pub fn mul(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Matrix {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }

    pub fn is_identity(&self) -> bool {
        *self == Matrix::IDENTITY
    }

    /// Parse a `transform` attribute value into a single composed matrix.
    pub fn parse_list(s: &str) -> Result<Matrix, Error> {
        let mut m = Matrix::IDENTITY;
        for token in TransformListParser::from(s) {
            let t = match token? {
                TransformListToken::Matrix { a, b, c, d, e, f } => Matrix::new(a, b, c, d, e, f),
                TransformListToken::Translate { tx, ty } => Matrix::translate(tx, ty),
                TransformListToken::Scale { sx, sy } => Matrix::scale(sx, sy),
                TransformListToken::Rotate { angle } => Matrix::rotate(angle),
                TransformListToken::SkewX { angle } => Matrix::skew_x(angle),
                TransformListToken::SkewY { angle } => Matrix::skew_y(angle),
            };
            m = m.mul(&t);
        }
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::Matrix;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn rotate_quarter_turn() {
        let m = Matrix::rotate(90.0);
        let (x, y) = m.apply(1.0, 0.0);
        assert!(close(x, 0.0) && close(y, 1.0));
    }

    #[test]
    fn compose_applies_rightmost_first() {
        // translate(10, 0) after scale(2): point is scaled first.
        let m = Matrix::translate(10.0, 0.0).mul(&Matrix::scale(2.0, 2.0));
        let (x, y) = m.apply(3.0, 4.0);
        assert!(close(x, 16.0) && close(y, 8.0));
    }

    #[test]
    fn invert_round_trips() {
        let m = Matrix::rotate(37.0)
            .mul(&Matrix::scale(2.0, 0.5))
            .mul(&Matrix::translate(5.0, -3.0));
        let inv = m.invert().unwrap();
        let (x, y) = m.apply(1.5, -2.5);
        let (rx, ry) = inv.apply(x, y);
        assert!(close(rx, 1.5) && close(ry, -2.5));
    }

    #[test]
    fn parse_list_composes_in_order() {
        let m = Matrix::parse_list("translate(10 0) scale(2)").unwrap();
        let (x, _) = m.apply(1.0, 0.0);
        assert!(close(x, 12.0));
    }

    #[test]
    fn parse_list_rejects_garbage() {
        assert!(Matrix::parse_list("rotate(nope)").is_err());
    }
}
