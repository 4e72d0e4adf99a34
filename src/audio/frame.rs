// One stereo frame, the unit the render engine mixes in.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn mono(s: f32) -> Self {
        Self { left: s, right: s }
    }

    #[inline]
    pub fn add_scaled(&mut self, other: StereoFrame, l: f32, r: f32) {
        self.left += other.left * l;
        self.right += other.right * r;
    }
}
