/// High-level response after a surface error.
///
/// None of these stop the frame loop except `Fatal`, which only tears down the 3D
/// layer of the affected window.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering resumes next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Unrecoverable (commonly OOM); the 3D layer is dropped.
    Fatal,
}
