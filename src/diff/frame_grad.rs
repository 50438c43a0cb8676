//! Gradients of the Frenet-like frame w.r.t. the curve derivatives.
//!
//! Only the normal and binormal orient the tube, so only they have a backward
//! pass. Both are normalized cross products of `d` (first derivative) and `a`
//! (second derivative). Where the forward pass zeroed a vector because its
//! denominator fell below epsilon, the gradient is zero too.

use nalgebra::{Matrix3, Vector3};

/// Backward of normalization `v / ‖v‖`: dL/dv = (I − v̂v̂ᵀ) · dL/dv̂ / ‖v‖.
fn normalize_grad(v: &Vector3<f64>, d_unit: &Vector3<f64>, epsilon: f64) -> Vector3<f64> {
    let n = v.norm();
    if n <= epsilon {
        return Vector3::zeros();
    }
    let unit = v / n;
    (Matrix3::identity() - unit * unit.transpose()) * d_unit / n
}

/// B = (d × a) / ‖d × a‖. Returns (dL/dd, dL/da).
pub fn binormal_grad(
    d: &Vector3<f64>,
    a: &Vector3<f64>,
    d_binormal: &Vector3<f64>,
    epsilon: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let w = d.cross(a);
    let d_w = normalize_grad(&w, d_binormal, epsilon);
    // w = d × a
    (a.cross(&d_w), d_w.cross(d))
}

/// N = (d × u) / (‖d‖ · ‖u‖) with u = a × d. Returns (dL/dd, dL/da).
pub fn normal_grad(
    d: &Vector3<f64>,
    a: &Vector3<f64>,
    d_normal: &Vector3<f64>,
    epsilon: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let u = a.cross(d);
    let d_len = d.norm();
    let u_len = u.norm();
    if d_len <= epsilon || u_len <= epsilon {
        return (Vector3::zeros(), Vector3::zeros());
    }

    let n = d.cross(&u);
    let normal = n / (d_len * u_len);
    let g_dot_n = d_normal.dot(&normal);

    let d_n = d_normal / (d_len * u_len);
    let d_dlen = -g_dot_n / d_len;
    let d_ulen = -g_dot_n / u_len;

    // n = d × u
    let mut d_d = u.cross(&d_n) + d * (d_dlen / d_len);
    let d_u = d_n.cross(d) + u * (d_ulen / u_len);

    // u = a × d
    d_d += d_u.cross(a);
    let d_a = d.cross(&d_u);

    (d_d, d_a)
}
