/// A type that can be encoded into a sequence of bytes.
pub trait Encode {
    /// Returns the number of bytes this value will take when encoded.
    fn size(&self) -> usize;

    /// Encodes this instance into the provided byte slice.
    ///
    /// `data` must be at least [`Encode::size`] bytes long.
    fn encode(&self, data: &mut [u8]);

    /// Encodes this instance into a freshly allocated buffer of exactly [`Encode::size`] bytes.
    fn to_frame(&self) -> Vec<u8> {
        let mut frame = vec![0; self.size()];
        self.encode(&mut frame);
        frame
    }
}

impl Encode for u8 {
    fn size(&self) -> usize {
        1
    }

    fn encode(&self, data: &mut [u8]) {
        data[0] = *self;
    }
}
