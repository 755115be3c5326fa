use serde::{Deserialize, Serialize};

pub type TaskId = i64;

/// Etiqueta de fase de una tarea. Los valores numéricos viajan por el wire
/// tal cual, así que no se pueden reordenar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Assignment {
    Snooze = 0,
    Abort = 1,
    Reduce = 2,
    Map = 3,
}

impl From<Assignment> for u8 {
    fn from(assignment: Assignment) -> u8 {
        assignment as u8
    }
}

impl TryFrom<u8> for Assignment {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Assignment::Snooze),
            1 => Ok(Assignment::Abort),
            2 => Ok(Assignment::Reduce),
            3 => Ok(Assignment::Map),
            other => Err(format!("assignment desconocido: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub assignment: Assignment,

    /// MAP: archivo de entrada. REDUCE: partición intermedia "mr-map-{k}".
    pub file: String,

    /// MAP: cantidad R de particiones. REDUCE: índice 1..=R de la partición
    /// que le toca a esta tarea.
    pub n_reduce: u32,
}

impl Task {
    /// Directiva de control (SNOOZE / ABORT), sin payload.
    pub fn control(assignment: Assignment) -> Self {
        Task {
            id: 0,
            assignment,
            file: String::new(),
            n_reduce: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_keeps_wire_values() {
        assert_eq!(u8::from(Assignment::Snooze), 0);
        assert_eq!(u8::from(Assignment::Abort), 1);
        assert_eq!(u8::from(Assignment::Reduce), 2);
        assert_eq!(u8::from(Assignment::Map), 3);
        assert_eq!(Assignment::try_from(3), Ok(Assignment::Map));
        assert!(Assignment::try_from(4).is_err());
    }

    #[test]
    fn assignment_serializes_as_number() {
        let encoded = serde_json::to_string(&Assignment::Map).unwrap();
        assert_eq!(encoded, "3");
        let decoded: Assignment = serde_json::from_str("2").unwrap();
        assert_eq!(decoded, Assignment::Reduce);
    }
}
