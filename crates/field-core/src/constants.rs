// Shared simulation tuning constants used by every scene.
//
// Per-frame factors (springs, dampings, lerp rates) are expressed against a
// 60 fps reference frame; time-based rates are per second.

// Frame clock
pub const MAX_FRAME_DT: f32 = 0.05; // clamp long pauses (tab switch, debugger) to 50 ms
pub const REFERENCE_FPS: f32 = 60.0; // frame rate the per-frame constants were tuned at

// Particle integration
pub const REPULSION_EPSILON: f32 = 1e-3; // below this distance the force direction is undefined
pub const PARKED_POSITION: f32 = -9999.0; // coordinate used to hide inactive pool slots

// Pulse propagation
pub const PULSE_POOL_SIZE: usize = 800;
pub const PULSE_SPEED_MIN: f32 = 0.009; // progress per frame
pub const PULSE_SPEED_SPAN: f32 = 0.013;
pub const PULSE_DECAY: f32 = 0.65; // strength multiplier per hop
pub const PULSE_MIN_STRENGTH: f32 = 0.05; // below this propagation stops
pub const PULSE_MAX_DELAY: f32 = 0.18; // seconds
pub const ARRIVAL_BOOST: f32 = 0.9; // activation added to the destination node
pub const PROGRESS_EPSILON: f32 = 1e-4; // absorbs f32 drift when summing per-frame steps

// Pointer probe (nearest node)
pub const PROBE_INTERVAL: f32 = 0.05; // seconds between nearest-node queries
pub const PROBE_RADIUS_PX: f32 = 120.0;
pub const PROBE_PULSE_SPEED: f32 = 0.012;
pub const PROBE_INCOMING_CHANCE: f64 = 0.5;

// Node glow
pub const GLOW_DECAY_PER_SEC: f32 = 2.2;
pub const GLOW_IDLE_BASE: f32 = 0.18;
pub const GLOW_IDLE_AMP: f32 = 0.07;
pub const GLOW_IDLE_FREQ: f32 = 1.1;
pub const GLOW_IDLE_PHASE_STEP: f32 = 0.78;
pub const EDGE_BRIGHTNESS_FLOOR: f32 = 0.045;

// Agent routing
pub const AGENT_SPEED_MIN: f32 = 0.0015; // edge progress per frame
pub const AGENT_SPEED_SPAN: f32 = 0.0025;
pub const AGENT_LIFT: f32 = 0.3;
pub const PROXIMITY_INTERVAL: f32 = 0.08; // seconds
pub const PROXIMITY_STRIDE: usize = 3; // only every Nth agent initiates a check
pub const PROXIMITY_RADIUS: f32 = 6.0;
pub const PROXIMITY_FLASH_CHANCE: f64 = 0.35;
pub const PROXIMITY_NODE_BOOST: f32 = 0.4;
pub const ARRIVAL_NODE_BOOST: f32 = 0.7;
pub const ARRIVAL_NODE_FLASH: f32 = 0.5;
pub const FLASH_POOL_SIZE: usize = 120;
pub const FLASH_FADE_PER_SEC: f32 = 4.5;

// Camera rig
pub const DEFAULT_FOVY_DEG: f32 = 55.0;
pub const DEFAULT_ZNEAR: f32 = 0.1;
pub const DEFAULT_ZFAR: f32 = 800.0;
