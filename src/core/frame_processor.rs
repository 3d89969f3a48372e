/// The core trait for all audio processors.
///
/// Implementors process a mono block of audio samples in place. The block
/// is delivered from a real-time context, so implementations must not
/// allocate, block or perform I/O inside `process`.
pub trait FrameProcessor {
    /// Processes a block of audio samples.
    ///
    /// # Arguments
    /// * `buffer` - The audio buffer to process (in-place).
    /// * `sample_index` - The global sample index of the start of the block.
    fn process(&mut self, buffer: &mut [f32], sample_index: u64);

    /// Clears all internal state back to what it was at construction.
    fn reset(&mut self) {}
}
