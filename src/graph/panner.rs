use serde::{Deserialize, Serialize};

/// Which axes the pan-mover effector drives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanTargets {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Default for PanTargets {
    fn default() -> Self {
        Self {
            x: true,
            y: false,
            z: false,
        }
    }
}

/*
Panner
======

Projects the mono mix to interleaved stereo from a point source position in a
y-up right-hand coordinate space, listener at the origin facing -z. Left/right
placement is equal-power from the x axis; the overall level follows the
inverse distance model (ref distance 1).

The pan-mover effector does not write single coordinates. It hands in one
control value and the flagged axes are recomputed from the base position in a
single call, so a render block never sees a half-updated position.
*/

#[derive(Debug, Clone)]
pub struct Panner {
    base_position: [f32; 3],
    offsets: [f32; 3],
}

impl Panner {
    pub fn new(base_position: [f32; 3]) -> Self {
        Self {
            base_position,
            offsets: [0.0; 3],
        }
    }

    pub fn set_base_position(&mut self, position: [f32; 3]) {
        self.base_position = position;
    }

    /// Replace all axis offsets at once from one control value.
    pub fn set_offsets(&mut self, value: f32, targets: PanTargets) {
        self.offsets = [
            if targets.x { value } else { 0.0 },
            if targets.y { value } else { 0.0 },
            if targets.z { value } else { 0.0 },
        ];
    }

    pub fn position(&self) -> [f32; 3] {
        [
            self.base_position[0] + self.offsets[0],
            self.base_position[1] + self.offsets[1],
            self.base_position[2] + self.offsets[2],
        ]
    }

    /// Per-channel gains for the current position.
    pub fn stereo_gains(&self) -> (f32, f32) {
        let [x, y, z] = self.position();
        let distance = (x * x + y * y + z * z).sqrt();

        // inverse distance model, ref distance 1
        let attenuation = if distance > 1.0 { 1.0 / distance } else { 1.0 };

        // equal-power pan from the x axis
        let pan = if distance > 0.0 {
            (x / distance).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let angle = (pan + 1.0) * std::f32::consts::FRAC_PI_4;
        (angle.cos() * attenuation, angle.sin() * attenuation)
    }

    /// Project a mono block into an interleaved stereo block.
    pub fn project(&self, mono: &[f32], stereo: &mut [f32]) {
        debug_assert_eq!(stereo.len(), mono.len() * 2);
        let (left, right) = self.stereo_gains();
        for (frame, sample) in stereo.chunks_exact_mut(2).zip(mono) {
            frame[0] += sample * left;
            frame[1] += sample * right;
        }
    }
}

impl Default for Panner {
    fn default() -> Self {
        Self::new([0.0, 0.0, -1.0])
    }
}
