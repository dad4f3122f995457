use serde::{ Serialize, Deserialize };

/// Closed difficulty set; any other value fails deserialization, which the
/// roadmap generator treats as an invalid attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// Field order here is the canonical key order of the emitted document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoadmapModule {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
    pub duration: String,
    pub difficulty: Difficulty,
    /// Ids of modules expected to be completed first. Not checked for
    /// forward references or cycles.
    #[serde(default)]
    pub prerequisites: Vec<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Roadmap {
    pub title: String,
    pub description: String,
    pub modules: Vec<RoadmapModule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_outside_enum_fails() {
        let raw = r#"{
            "id": 1,
            "title": "Basics",
            "description": "Start here",
            "topics": ["One"],
            "duration": "2 weeks",
            "difficulty": "Expert",
            "prerequisites": []
        }"#;
        assert!(serde_json::from_str::<RoadmapModule>(raw).is_err());
    }

    #[test]
    fn prerequisites_default_to_empty() {
        let raw = r#"{
            "id": 1,
            "title": "Basics",
            "description": "Start here",
            "topics": ["One", "Two"],
            "duration": "2 weeks",
            "difficulty": "Beginner"
        }"#;
        let module: RoadmapModule = serde_json::from_str(raw).unwrap();
        assert!(module.prerequisites.is_empty());
    }
}
