use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const ZERO_CHUNK_SIZE: usize = 64 * 1024;

static ZEROS: [u8; ZERO_CHUNK_SIZE] = [0; ZERO_CHUNK_SIZE];

/// Rounds `x` up to the next multiple of `alignment`, works for any non-zero alignment.
pub fn align_up(x: u64, alignment: u64) -> u64 {
    match x % alignment {
        0 => x,
        rem => x + (alignment - rem),
    }
}

/// Writes `count` zero bytes without allocating a buffer of that size.
pub async fn write_zeros<W: AsyncWrite + Unpin>(writer: &mut W, count: u64) -> std::io::Result<()> {
    let mut remaining = count;

    while remaining > 0 {
        let chunk = remaining.min(ZERO_CHUNK_SIZE as u64) as usize;
        writer.write_all(&ZEROS[..chunk]).await?;
        remaining -= chunk as u64;
    }

    Ok(())
}

/// Pads from `position` up to `target` with zeros, does nothing if already past it.
pub async fn pad_to<W: AsyncWrite + Unpin>(
    writer: &mut W,
    position: u64,
    target: u64,
) -> std::io::Result<()> {
    if target > position {
        write_zeros(writer, target - position).await?;
    }

    Ok(())
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn align_up_returns_correct_alignment() {
        assert_eq!(align_up(0, 0x9300), 0);
        assert_eq!(align_up(1, 0x9300), 0x9300);
        assert_eq!(align_up(0x9300, 0x9300), 0x9300);
        assert_eq!(align_up(0x9301, 0x9300), 0x12600);
        assert_eq!(align_up(23520, 0x9300), 37632);
    }

    #[test]
    fn align_up_is_idempotent_and_tight() {
        for x in [0u64, 1, 2352, 37631, 37632, 37633, 1_000_000, 734_003_200] {
            let padded = align_up(x, 0x9300);
            assert_eq!(padded % 0x9300, 0);
            assert!(padded >= x);
            assert!(padded - x < 0x9300);
            assert_eq!(align_up(padded, 0x9300), padded);
        }
    }

    #[tokio::test]
    async fn write_zeros_handles_large_padding() {
        let mut buffer = Vec::new();

        write_zeros(&mut buffer, ZERO_CHUNK_SIZE as u64 * 3 + 5).await.unwrap();

        assert_eq!(buffer.len(), ZERO_CHUNK_SIZE * 3 + 5);
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn pad_to_writes_correct_padding() {
        let mut buffer = vec![1u8; 10];

        pad_to(&mut buffer, 10, 16).await.unwrap();
        assert_eq!(buffer.len(), 16);
        assert_eq!(&buffer[10..], &[0u8; 6]);

        pad_to(&mut buffer, 16, 16).await.unwrap();
        pad_to(&mut buffer, 16, 8).await.unwrap();
        assert_eq!(buffer.len(), 16);
    }
}
