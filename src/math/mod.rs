// Transform types built on the fixed-size kernels
pub mod angle;
pub mod matrix;
pub mod vector;

pub use angle::{degrees, radians};
pub use matrix::{Mat3, Mat4};
pub use vector::{Vec3, Vec4};

pub type Mat4f = Mat4<f32>;
pub type Mat4d = Mat4<f64>;
pub type Mat3f = Mat3<f32>;
pub type Mat3d = Mat3<f64>;
pub type Vec4f = Vec4<f32>;
pub type Vec4d = Vec4<f64>;
pub type Vec3f = Vec3<f32>;
pub type Vec3d = Vec3<f64>;
