//! Runtime system trait

use tearline_core::Result;

/// A mountable component ticked by the frame loop
///
/// Components are created on mount and must stop all per-frame work and
/// pending timers on unmount; `update` after `unmount` is a no-op.
pub trait RuntimeSystem {
    /// Called once per frame with session time and frame delta (seconds)
    fn update(&mut self, now_ms: f64, dt: f64) -> Result<()>;

    /// Called when the component is being torn down
    fn unmount(&mut self);

    /// Whether the component is still mounted
    fn is_mounted(&self) -> bool;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
