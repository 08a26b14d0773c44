// SPDX-License-Identifier: MIT

/// Generates the little-endian accessors of [`Me2IOExt`](crate::Me2IOExt)
/// for each integer type: `read_<ty>_at`, `write_<ty>_at` and the run reader
/// `read_<ty>s_at`, which fills a slice from consecutive on-disk values (an
/// indirect block is a run of `u32`).
#[macro_export]
macro_rules! me2io_impl_primitive_rw {
    ($($ty:ty),+ $(,)?) => {
        $(
            paste::paste! {
                #[inline(always)]
                fn [<read_ $ty _at>](&mut self, offset: u64) -> Me2IOResult<$ty> {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    self.read_at(offset, &mut raw)?;
                    Ok(<$ty>::from_le_bytes(raw))
                }

                #[inline(always)]
                fn [<write_ $ty _at>](&mut self, offset: u64, value: $ty) -> Me2IOResult {
                    self.write_at(offset, &value.to_le_bytes())
                }

                fn [<read_ $ty s_at>](&mut self, offset: u64, out: &mut [$ty]) -> Me2IOResult {
                    const WIDTH: usize = core::mem::size_of::<$ty>();
                    let mut at = offset;
                    for chunk in out.chunks_mut($crate::BLOCK_BUF_SIZE / WIDTH) {
                        let mut raw = [0u8; $crate::BLOCK_BUF_SIZE];
                        let raw = &mut raw[..chunk.len() * WIDTH];
                        self.read_at(at, raw)?;
                        for (value, bytes) in chunk.iter_mut().zip(raw.chunks_exact(WIDTH)) {
                            let mut le = [0u8; WIDTH];
                            le.copy_from_slice(bytes);
                            *value = <$ty>::from_le_bytes(le);
                        }
                        at += raw.len() as u64;
                    }
                    Ok(())
                }
            }
        )+
    };
}
