use serde::Deserialize;

/// `[emerge]` table. Zero means "derive from the thread count".
#[derive(Clone, Debug, Deserialize)]
pub struct EmergeConfig {
    #[serde(default = "default_zero")]
    pub num_threads: usize,
    #[serde(default = "default_zero")]
    pub qlimit_total: usize,
    #[serde(default = "default_zero")]
    pub qlimit_diskonly: usize,
    #[serde(default = "default_zero")]
    pub qlimit_generate: usize,
}

fn default_zero() -> usize {
    0
}

impl Default for EmergeConfig {
    fn default() -> Self {
        Self {
            num_threads: default_zero(),
            qlimit_total: default_zero(),
            qlimit_diskonly: default_zero(),
            qlimit_generate: default_zero(),
        }
    }
}

/// Concrete worker count and queue limits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EmergeLimits {
    pub threads: usize,
    pub total: usize,
    pub diskonly: usize,
    pub generate: usize,
}

impl EmergeConfig {
    pub fn limits(&self) -> EmergeLimits {
        let threads = if self.num_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .saturating_sub(2)
                .max(1)
        } else {
            self.num_threads
        };
        let or = |v: usize, per_thread: usize| if v == 0 { threads * per_thread } else { v };
        EmergeLimits {
            threads,
            total: or(self.qlimit_total, 128),
            diskonly: or(self.qlimit_diskonly, 100),
            generate: or(self.qlimit_generate, 32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limits_scale_with_threads() {
        let cfg = EmergeConfig {
            num_threads: 3,
            qlimit_generate: 7,
            ..EmergeConfig::default()
        };
        assert_eq!(
            cfg.limits(),
            EmergeLimits {
                threads: 3,
                total: 384,
                diskonly: 300,
                generate: 7,
            }
        );
    }

    #[test]
    fn auto_thread_count_is_at_least_one() {
        assert!(EmergeConfig::default().limits().threads >= 1);
    }

    #[test]
    fn parses_partial_table() {
        let cfg: EmergeConfig = toml::from_str("num_threads = 2\nqlimit_total = 10\n").unwrap();
        assert_eq!(cfg.num_threads, 2);
        assert_eq!(cfg.qlimit_total, 10);
        assert_eq!(cfg.qlimit_diskonly, 0);
    }
}
