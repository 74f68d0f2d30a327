/// Static resource bounds of an interpreter. Fixed for its whole lifetime;
/// running out of any of them is fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Cells per semispace. The heap holds twice this many.
    pub heap_size: usize,
    /// Root slots registered at once, across all scopes.
    pub max_roots: usize,
    /// Nested root scopes.
    pub max_frames: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            heap_size: 2048,
            max_roots: 2048,
            max_frames: 256,
        }
    }
}

impl Config {
    pub fn heap_size(self, heap_size: usize) -> Config {
        Config { heap_size, ..self }
    }

    pub fn max_roots(self, max_roots: usize) -> Config {
        Config { max_roots, ..self }
    }

    pub fn max_frames(self, max_frames: usize) -> Config {
        Config { max_frames, ..self }
    }
}

#[test]
fn test_builder() {
    let config = Config::default().heap_size(16).max_frames(4);
    assert_eq!(config.heap_size, 16);
    assert_eq!(config.max_frames, 4);
    assert_eq!(config.max_roots, Config::default().max_roots);
}
