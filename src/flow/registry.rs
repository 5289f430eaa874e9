//! Step registry: the fixed, ordered catalog of questions.

use crate::error::RegistryError;

use super::path::FieldPath;
use super::rules::{Rule, Transform};

/// One question in the flow: where the answer goes, what is asked, how the
/// answer is checked and how it is reshaped.
#[derive(Debug, Clone)]
pub struct Step {
    target: FieldPath,
    prompt: String,
    rule: Rule,
    transform: Transform,
}

impl Step {
    /// Build a step. Fails if `path` is not a valid target path.
    pub fn new(path: &str, prompt: impl Into<String>, rule: Rule) -> Result<Self, RegistryError> {
        Ok(Self {
            target: FieldPath::parse(path)?,
            prompt: prompt.into(),
            rule,
            transform: Transform::None,
        })
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn target(&self) -> &FieldPath {
        &self.target
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }
}

/// Ordered, immutable sequence of steps, indexed `0..len()`.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<Step>,
}

impl StepRegistry {
    pub fn new(steps: Vec<Step>) -> Result<Self, RegistryError> {
        if steps.is_empty() {
            return Err(RegistryError::Empty);
        }
        Ok(Self { steps })
    }

    /// The resume interview.
    pub fn resume() -> Result<Self, RegistryError> {
        let min2 = || Rule::min_length(2);
        Self::new(vec![
            Step::new(
                "personalInfo.name",
                "What is your full name?",
                Rule::min_length_with(2, "Name too short"),
            )?,
            Step::new(
                "personalInfo.phone",
                "What is your phone number?",
                Rule::min_length_with(5, "Phone seems too short"),
            )?,
            Step::new(
                "personalInfo.email",
                "What is your email address?",
                Rule::email("Please provide a valid email"),
            )?,
            Step::new(
                "personalInfo.city",
                "Which city and state are you located in?",
                min2(),
            )?,
            Step::new(
                "workExperience[0].jobTitle",
                "What is your most recent job title?",
                min2(),
            )?
            .with_transform(Transform::Professionalize),
            Step::new(
                "workExperience[0].company",
                "What is the company name for that job?",
                min2(),
            )?,
            Step::new(
                "workExperience[0].yearsWorked",
                "How many years (number) did you work there?",
                Rule::number_range(0.0, 60.0),
            )?,
            Step::new(
                "workExperience[0].responsibilities",
                "List main responsibilities (comma separated).",
                min2(),
            )?
            .with_transform(Transform::Sentences),
            Step::new("skills", "List your key skills (comma separated).", min2())?
                .with_transform(Transform::List),
            Step::new(
                "education[0].degree",
                "What is your highest degree or certification?",
                min2(),
            )?,
            Step::new(
                "education[0].institution",
                "Which institution awarded it?",
                min2(),
            )?,
            Step::new(
                "education[0].years",
                "What years did you attend (e.g. 2019-2023)?",
                min2(),
            )?,
            Step::new(
                "personalInfo.languages",
                "List any languages you speak (comma separated).",
                min2(),
            )?
            .with_transform(Transform::List),
        ])
    }

    /// Step at `index`, or `None` past the end.
    pub fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first_prompt(&self) -> &str {
        // Construction rejects empty registries.
        self.steps[0].prompt()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_registry_order() {
        let registry = StepRegistry::resume().unwrap();
        let paths: Vec<&str> = registry.iter().map(|s| s.target().as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "personalInfo.name",
                "personalInfo.phone",
                "personalInfo.email",
                "personalInfo.city",
                "workExperience[0].jobTitle",
                "workExperience[0].company",
                "workExperience[0].yearsWorked",
                "workExperience[0].responsibilities",
                "skills",
                "education[0].degree",
                "education[0].institution",
                "education[0].years",
                "personalInfo.languages",
            ]
        );
        assert_eq!(registry.len(), 13);
        assert_eq!(registry.first_prompt(), "What is your full name?");
    }

    #[test]
    fn transforms_are_assigned() {
        let registry = StepRegistry::resume().unwrap();
        let transform_of = |path: &str| {
            registry
                .iter()
                .find(|s| s.target().as_str() == path)
                .map(|s| s.transform())
                .unwrap()
        };
        assert_eq!(
            transform_of("workExperience[0].jobTitle"),
            Transform::Professionalize
        );
        assert_eq!(
            transform_of("workExperience[0].responsibilities"),
            Transform::Sentences
        );
        assert_eq!(transform_of("skills"), Transform::List);
        assert_eq!(transform_of("personalInfo.languages"), Transform::List);
        assert_eq!(transform_of("personalInfo.name"), Transform::None);
    }

    #[test]
    fn step_at_past_end_is_none() {
        let registry = StepRegistry::resume().unwrap();
        assert!(registry.step_at(12).is_some());
        assert!(registry.step_at(13).is_none());
    }

    #[test]
    fn empty_registry_rejected() {
        assert!(matches!(StepRegistry::new(vec![]), Err(RegistryError::Empty)));
    }

    #[test]
    fn malformed_path_rejected_at_build() {
        let err = Step::new("workExperience[x].title", "?", Rule::min_length(1)).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath { .. }));
    }
}
