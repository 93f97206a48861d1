//! Secure randomness for key generation and encryption.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

/// A source of cryptographically secure random bytes
pub trait EntropySource: Send + Sync {
    /// Fill `dest` completely, or fail with [`Error::EntropyUnavailable`]
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// The operating system generator
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            tracing::warn!("OS random generator unavailable: {}", e);
            Error::EntropyUnavailable(e.to_string())
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    /// Hands out pre-arranged byte strings in order, then fails
    pub(crate) struct ScriptedEntropy {
        chunks: Mutex<VecDeque<Vec<u8>>>,
    }

    impl ScriptedEntropy {
        pub fn new(chunks: impl IntoIterator<Item = Vec<u8>>) -> Self {
            Self {
                chunks: Mutex::new(chunks.into_iter().collect()),
            }
        }

        pub fn remaining(&self) -> usize {
            self.chunks.lock().len()
        }
    }

    impl EntropySource for ScriptedEntropy {
        fn fill(&self, dest: &mut [u8]) -> Result<()> {
            let chunk = self
                .chunks
                .lock()
                .pop_front()
                .ok_or_else(|| Error::EntropyUnavailable("script exhausted".into()))?;
            assert_eq!(chunk.len(), dest.len(), "scripted chunk has the wrong size");
            dest.copy_from_slice(&chunk);
            Ok(())
        }
    }

    /// Always unavailable
    pub(crate) struct NoEntropy;

    impl EntropySource for NoEntropy {
        fn fill(&self, _dest: &mut [u8]) -> Result<()> {
            Err(Error::EntropyUnavailable("no generator".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_os_entropy_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        OsEntropy.fill(&mut a).unwrap();
        OsEntropy.fill(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_scripted_entropy_runs_out() {
        let source = ScriptedEntropy::new([vec![1, 2], vec![3, 4]]);
        let mut buf = [0u8; 2];
        source.fill(&mut buf).unwrap();
        assert_eq!(buf, [1, 2]);
        source.fill(&mut buf).unwrap();
        assert_eq!(buf, [3, 4]);
        assert_eq!(source.remaining(), 0);
        assert!(matches!(
            source.fill(&mut buf),
            Err(Error::EntropyUnavailable(_))
        ));
    }

    #[test]
    fn test_no_entropy_fails() {
        assert_eq!(NoEntropy.fill(&mut [0u8; 4]).unwrap_err().code(), 300);
    }
}
