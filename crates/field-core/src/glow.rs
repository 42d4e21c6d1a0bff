use crate::constants::{
    GLOW_DECAY_PER_SEC, GLOW_IDLE_AMP, GLOW_IDLE_BASE, GLOW_IDLE_FREQ, GLOW_IDLE_PHASE_STEP,
};

#[derive(Clone, Copy, Debug)]
pub struct GlowParams {
    /// Fraction of activation lost per second.
    pub decay_per_sec: f32,
    /// Flash units lost per second.
    pub flash_fade_per_sec: f32,
    pub idle_base: f32,
    pub idle_amp: f32,
    pub idle_freq: f32,
    /// Phase offset between consecutive nodes of the idle wave.
    pub idle_phase_step: f32,
}

impl Default for GlowParams {
    fn default() -> Self {
        Self {
            decay_per_sec: GLOW_DECAY_PER_SEC,
            flash_fade_per_sec: 0.0,
            idle_base: GLOW_IDLE_BASE,
            idle_amp: GLOW_IDLE_AMP,
            idle_freq: GLOW_IDLE_FREQ,
            idle_phase_step: GLOW_IDLE_PHASE_STEP,
        }
    }
}

/// Per-node brightness: a decaying activation in [0, 1], a short flash term
/// on top, and an idle wave the displayed value never drops below.
#[derive(Clone, Debug)]
pub struct NodeGlow {
    params: GlowParams,
    activation: Vec<f32>,
    flash: Vec<f32>,
}

impl NodeGlow {
    pub fn new(nodes: usize, params: GlowParams) -> Self {
        Self {
            params,
            activation: vec![0.0; nodes],
            flash: vec![0.0; nodes],
        }
    }

    /// Add `amount` to a node's activation, saturating at 1.
    pub fn excite(&mut self, node: u32, amount: f32) {
        if let Some(a) = self.activation.get_mut(node as usize) {
            *a = (*a + amount).clamp(0.0, 1.0);
        }
    }

    pub fn flash(&mut self, node: u32, amount: f32) {
        if let Some(f) = self.flash.get_mut(node as usize) {
            *f = amount.max(0.0);
        }
    }

    pub fn decay(&mut self, dt: f32) {
        let keep = (1.0 - self.params.decay_per_sec * dt).clamp(0.0, 1.0);
        for a in &mut self.activation {
            *a *= keep;
        }
        let fade = self.params.flash_fade_per_sec * dt;
        for f in &mut self.flash {
            *f = (*f - fade).max(0.0);
        }
    }

    #[inline]
    pub fn idle(&self, time: f32, node: usize) -> f32 {
        let p = &self.params;
        p.idle_base + p.idle_amp * (time * p.idle_freq + node as f32 * p.idle_phase_step).sin()
    }

    #[inline]
    pub fn activation(&self, node: u32) -> f32 {
        self.activation[node as usize]
    }

    pub fn activations(&self) -> &[f32] {
        &self.activation
    }

    /// Brightness shown for `node` at `time`.
    #[inline]
    pub fn displayed(&self, time: f32, node: usize) -> f32 {
        self.idle(time, node)
            .max(self.activation[node] + self.flash[node])
    }

    /// Grey-scale node colors as a flat rgb buffer.
    pub fn write_colors(&self, time: f32, out: &mut Vec<f32>) {
        out.clear();
        for i in 0..self.activation.len() {
            let b = self.displayed(time, i);
            out.extend_from_slice(&[b, b, b]);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.activation.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.activation.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_saturates_and_decays() {
        let mut glow = NodeGlow::new(2, GlowParams::default());
        glow.excite(0, 0.9);
        glow.excite(0, 0.9);
        assert_eq!(glow.activation(0), 1.0);
        glow.decay(0.1);
        assert!((glow.activation(0) - 0.78).abs() < 1e-6);
        // a huge dt floors at zero instead of flipping sign
        glow.decay(10.0);
        assert_eq!(glow.activation(0), 0.0);
    }

    #[test]
    fn displayed_never_below_idle() {
        let glow = NodeGlow::new(4, GlowParams::default());
        for i in 0..4 {
            let idle = glow.idle(1.3, i);
            assert!(glow.displayed(1.3, i) >= idle);
            assert!(idle >= GLOW_IDLE_BASE - GLOW_IDLE_AMP);
        }
    }

    #[test]
    fn flash_fades_linearly() {
        let params = GlowParams {
            flash_fade_per_sec: 3.5,
            ..GlowParams::default()
        };
        let mut glow = NodeGlow::new(1, params);
        glow.flash(0, 1.0);
        glow.decay(0.1);
        assert!((glow.displayed(0.0, 0) - 0.65).abs() < 1e-5);
    }

    #[test]
    fn out_of_range_nodes_are_ignored() {
        let mut glow = NodeGlow::new(1, GlowParams::default());
        glow.excite(5, 1.0);
        glow.flash(5, 1.0);
        assert_eq!(glow.activation(0), 0.0);
    }
}
