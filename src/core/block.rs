use crate::FrameProcessor;

/// Adapts a backend's separate input/output blocks to an in-place
/// [`FrameProcessor`].
///
/// Samples are handed to the processor in order, and the processor's state
/// carries over from one block to the next. The running sample clock is
/// tracked here and passed as the `sample_index` of each block.
pub struct BlockProcessor<P> {
    processor: P,
    sample_clock: u64,
}

impl<P: FrameProcessor> BlockProcessor<P> {
    pub fn new(processor: P) -> Self {
        BlockProcessor {
            processor,
            sample_clock: 0,
        }
    }

    /// Computes `output[i]` from `input[i]` for every frame in the block.
    ///
    /// Backends deliver equal lengths. If they ever differ, only the common
    /// prefix is processed and the remaining output slots are silenced.
    /// An empty block leaves all state untouched.
    #[inline]
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let frames = input.len().min(output.len());
        let (processed, surplus) = output.split_at_mut(frames);
        surplus.fill(0.0);

        if frames == 0 {
            return;
        }

        processed.copy_from_slice(&input[..frames]);
        self.processor.process(processed, self.sample_clock);
        self.sample_clock += frames as u64;
    }

    /// Total number of frames processed so far.
    pub fn sample_clock(&self) -> u64 {
        self.sample_clock
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }
}
