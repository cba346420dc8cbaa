use std::{fmt::Display, str::FromStr};

use super::SessionError;

/// memory share of a single executor, in bytes. parsed from size strings
/// such as `512m`, `10g` or `2048k`; a bare number is read as bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExecutorMemory(u64);

const KIB: u64 = 1024;

impl ExecutorMemory {
    pub fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl FromStr for ExecutorMemory {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        let value = value.strip_suffix('b').unwrap_or(&value);
        let split_at = value
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(value.len());
        let (digits, unit) = value.split_at(split_at);
        let amount = digits.parse::<u64>().map_err(|e| {
            SessionError::InvalidConfig(format!("executor memory '{s}' has no valid amount: {e}"))
        })?;
        let multiplier = match unit {
            "" => 1,
            "k" => KIB,
            "m" => KIB.pow(2),
            "g" => KIB.pow(3),
            "t" => KIB.pow(4),
            other => {
                return Err(SessionError::InvalidConfig(format!(
                    "executor memory '{s}' has unknown unit '{other}'"
                )))
            }
        };
        let bytes = amount.checked_mul(multiplier).ok_or_else(|| {
            SessionError::InvalidConfig(format!("executor memory '{s}' overflows u64"))
        })?;
        if bytes == 0 {
            return Err(SessionError::InvalidConfig(format!(
                "executor memory '{s}' must be positive"
            )));
        }
        Ok(ExecutorMemory(bytes))
    }
}

impl Display for ExecutorMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = [("t", KIB.pow(4)), ("g", KIB.pow(3)), ("m", KIB.pow(2)), ("k", KIB)];
        for (suffix, size) in units {
            if self.0 % size == 0 {
                return write!(f, "{}{suffix}", self.0 / size);
            }
        }
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::ExecutorMemory;

    #[test]
    fn test_parse_units() {
        let cases = [
            ("10g", 10 * 1024 * 1024 * 1024),
            ("512m", 512 * 1024 * 1024),
            ("512MB", 512 * 1024 * 1024),
            ("2048k", 2048 * 1024),
            ("4096", 4096),
        ];
        for (input, expected) in cases {
            let memory: ExecutorMemory = input.parse().unwrap();
            assert_eq!(memory.bytes(), expected, "{input}");
        }
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["", "g", "10x", "0g", "-1g", "99999999999999t"] {
            assert!(input.parse::<ExecutorMemory>().is_err(), "{input}");
        }
    }

    #[test]
    fn test_display_uses_largest_unit() {
        let memory: ExecutorMemory = "10g".parse().unwrap();
        assert_eq!(memory.to_string(), "10g");
        assert_eq!(ExecutorMemory::from_bytes(1536).to_string(), "1536");
        assert_eq!(ExecutorMemory::from_bytes(2048).to_string(), "2k");
    }
}
