use async_trait::async_trait;
use reading_core::model::{Difficulty, Passage, PassageError, Question, QuestionBank, Section};
use std::sync::Arc;

use crate::provider::{ContentError, ContentProvider};

pub const PASSAGE_TITLE: &str = "The Secret Life of Honeybees";

const HIVE_AND_QUEEN: &str = "A honeybee colony can hold as many as 60,000 bees, and every single one of them has a job. \
Walk past a hive on a summer afternoon and it may look like chaos, but inside it is more organized than most human cities. \
At the center of it all is the queen. Her title sounds grand, yet she does not rule the hive or make its decisions. \
Her one task is to lay eggs, sometimes more than a thousand in a single day. \
The choices that matter, such as when to swarm or where to build, are made collectively by the workers around her.";

const WORKERS_AND_DRONES: &str = "Worker bees are all female, and their duties change as they grow older. \
A young worker spends her first weeks indoors: cleaning cells, feeding larvae, and building fresh honeycomb from wax. \
As she matures she moves to the entrance, where she guards the hive against wasps and robber bees. \
In the final stage of her life she becomes a forager, flying up to five miles away in search of nectar and pollen. \
Drones are the hive's males. They gather no food, build no comb, and carry no sting to defend the colony; their only purpose is to mate with a queen. \
When autumn comes and food grows scarce, the workers push the drones out of the hive so that the colony's stores last through winter.";

const COMMUNICATION_AND_LEGACY: &str = "A forager who finds a rich patch of flowers returns home and performs the waggle dance. \
She runs in a figure-eight pattern, waggling her body through the straight middle stretch. \
The angle of that run, measured against straight up on the comb, shows the direction of the flowers relative to the sun. \
The length of the waggle tells her sisters how far away the food is. \
With this dance other bees can fly straight to a source they have never seen. \
All of this effort adds up slowly: a single worker makes only about a twelfth of a teaspoon of honey in her whole life. \
Every spoonful of honey represents the life's work of about twelve bees.";

/// Built-in passage with its pre-generated questions.
///
/// Always available; sessions fall back to it whenever other content or question
/// generation fails.
#[derive(Debug, Clone)]
pub struct BundledContent {
    passage: Arc<Passage>,
    questions: QuestionBank,
}

impl BundledContent {
    /// # Errors
    ///
    /// Returns `ContentError` if the bundled data fails validation.
    pub fn new() -> Result<Self, ContentError> {
        let passage = bundled_passage()?;
        let questions = QuestionBank::new(bundled_questions(), &passage)?;
        Ok(Self {
            passage: Arc::new(passage),
            questions,
        })
    }

    #[must_use]
    pub fn passage_arc(&self) -> Arc<Passage> {
        Arc::clone(&self.passage)
    }

    /// The pre-generated questions, already validated against the passage.
    #[must_use]
    pub fn question_bank(&self) -> &QuestionBank {
        &self.questions
    }
}

#[async_trait]
impl ContentProvider for BundledContent {
    async fn passage(&self) -> Result<Arc<Passage>, ContentError> {
        Ok(self.passage_arc())
    }

    async fn questions(&self) -> Result<Vec<Question>, ContentError> {
        Ok(self.questions.questions().to_vec())
    }
}

/// # Errors
///
/// Returns `PassageError` if the section list is invalid.
pub fn bundled_passage() -> Result<Passage, PassageError> {
    Passage::new(
        PASSAGE_TITLE,
        vec![
            Section::new("section-1", "The Hive & The Queen", HIVE_AND_QUEEN),
            Section::new("section-2", "Workers & Drones", WORKERS_AND_DRONES),
            Section::new("section-3", "Communication & Legacy", COMMUNICATION_AND_LEGACY),
        ],
    )
}

fn concepts(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

#[must_use]
pub fn bundled_questions() -> Vec<Question> {
    vec![
        // The Hive & The Queen
        Question::new(
            "q1",
            "section-1",
            "The queen bee has an impressive title, but the passage suggests her role is more limited than it sounds. In what way is her title misleading?",
            concepts(&[
                "queen doesn't make decisions",
                "her role is only to lay eggs",
                "she doesn't rule or control the hive",
                "title suggests authority she doesn't have",
            ]),
            Difficulty::Analytical,
        ),
        Question::new(
            "q2",
            "section-1",
            "The author compares beehives to human cities. Based on the passage, what makes the author believe beehives are even more organized?",
            concepts(&[
                "every single bee has a job",
                "60,000 bees all with defined roles",
                "more organized than most human cities",
                "structured division of labor",
            ]),
            Difficulty::Inferential,
        ),
        // Workers & Drones
        Question::new(
            "q3",
            "section-2",
            "Describe how a worker bee's responsibilities change as she ages. Why do you think the hive is organized this way?",
            concepts(&[
                "young workers: cleaning, feeding larvae, building honeycomb",
                "older workers: guarding the entrance",
                "oldest workers: foraging up to five miles away",
                "progression from safe indoor tasks to riskier outdoor tasks",
            ]),
            Difficulty::Analytical,
        ),
        Question::new(
            "q4",
            "section-2",
            "Why do the worker bees push the drones out of the hive in autumn? What does this tell us about how the hive prioritizes survival?",
            concepts(&[
                "food becomes scarce in autumn",
                "drones don't contribute to food/defense/work",
                "conserving resources for the colony",
                "hive prioritizes the group over individuals",
            ]),
            Difficulty::Inferential,
        ),
        // Communication & Legacy
        Question::new(
            "q5",
            "section-3",
            "Explain how the waggle dance works. What specific information does it communicate to other bees?",
            concepts(&[
                "performed by foragers who found flowers",
                "angle of dance shows direction relative to the sun",
                "length of waggle shows distance",
                "tells other bees exactly where to find food",
            ]),
            Difficulty::Foundational,
        ),
        Question::new(
            "q6",
            "section-3",
            "The passage ends by saying \"every spoonful of honey represents the life's work of about twelve bees.\" What is the author trying to make the reader feel or understand with this final statement?",
            concepts(&[
                "honey is incredibly labor-intensive to produce",
                "appreciation for how much work goes into honey",
                "the scale of effort relative to the small amount produced",
                "emotional connection to the value of bees' work",
            ]),
            Difficulty::Inferential,
        ),
    ]
}
