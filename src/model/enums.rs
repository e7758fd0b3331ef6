//! Enumerated columns: stored as SMALLINT codes, exchanged as fixed strings.

use crate::error::AppError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! code_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, sqlx::Type)]
        #[repr(i16)]
        pub enum $name {
            $($variant = $code),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn code(self) -> i16 {
                self as i16
            }

            pub fn from_code(code: i16) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::InvalidValue(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

code_enum! {
    /// Operational state shared by satellites, links and repairs.
    State {
        Normal = 1 => "normal",
        Abnormal = 2 => "abnormal",
        Offline = 3 => "offline",
        Repairing = 4 => "repairing",
    }
}

code_enum! {
    FaultType {
        Hardware = 1 => "hardware",
        Software = 2 => "software",
        Communication = 3 => "communication",
        Power = 4 => "power",
        Thermal = 5 => "thermal",
    }
}

code_enum! {
    Role {
        Control = 1 => "CONTROL",
        Exec = 2 => "EXEC",
        Trace = 3 => "TRACE",
    }
}

code_enum! {
    InstructionType {
        OperatedAvoidance = 1 => "operated_avoidance",
        AutonomousAvoidance = 2 => "autonomous_avoidance",
    }
}

code_enum! {
    /// Instruction lifecycle. Each transition is a new row.
    ExecState {
        NotExecuted = 1 => "not_executed",
        Executing = 2 => "executing",
        Succeeded = 3 => "succeeded",
        Failed = 4 => "failed",
    }
}

code_enum! {
    ThreatDegree {
        None = 1 => "none",
        Low = 2 => "low",
        High = 3 => "high",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_strings() {
        for s in State::ALL {
            assert_eq!(State::from_code(s.code()), Some(*s));
            assert_eq!(s.as_str().parse::<State>().unwrap(), *s);
        }
        for r in Role::ALL {
            assert_eq!(r.to_string().parse::<Role>().unwrap(), *r);
        }
    }

    #[test]
    fn fixed_codes() {
        assert_eq!(FaultType::Thermal.code(), 5);
        assert_eq!(ExecState::Failed.code(), 4);
        assert_eq!(ThreatDegree::None.code(), 1);
        assert_eq!(InstructionType::AutonomousAvoidance.code(), 2);
        assert_eq!(Role::from_code(2), Some(Role::Exec));
        assert_eq!(Role::from_code(9), None);
    }

    #[test]
    fn unknown_strings_are_invalid_values() {
        let err = "broken".parse::<State>().unwrap_err();
        assert!(matches!(err, AppError::InvalidValue(_)));
        assert!("control".parse::<Role>().is_err());
    }

    #[test]
    fn serialized_as_text() {
        assert_eq!(serde_json::to_string(&ExecState::NotExecuted).unwrap(), "\"not_executed\"");
        let r: Role = serde_json::from_str("\"TRACE\"").unwrap();
        assert_eq!(r, Role::Trace);
        assert!(serde_json::from_str::<Role>("\"ADMIN\"").is_err());
    }
}
