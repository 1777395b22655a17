use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{ChallengeDetails, CreateChallengeRequest, UpdateChallengeRequest};
use super::presentation::{
    categories, days_left, requirements, reward_breakdown, skill_level_label, timeline,
};
use super::repo_types::{ChallengePatch, ChallengeWithSponsor, NewChallenge};
use crate::validation::{bounded, optional_url, ValidationError};

const TITLE_SHORT: &str = "Title must be at least 5 characters long.";
const DESCRIPTION_SHORT: &str = "Description must be at least 20 characters long.";
const REWARD_SHORT: &str = "Reward structure must be specified.";
const INDUSTRY_SHORT: &str = "Industry must be specified.";
const RUBRIC_SHORT: &str = "Rubric must be at least 10 characters long.";
const BAD_URL: &str = "Please enter a valid URL.";

pub fn prepare_challenge(
    sponsor_id: Uuid,
    req: &CreateChallengeRequest,
) -> Result<NewChallenge, ValidationError> {
    Ok(NewChallenge {
        sponsor_id,
        title: bounded("title", &req.title, 5, 100, TITLE_SHORT)?,
        description: bounded("description", &req.description, 20, 5000, DESCRIPTION_SHORT)?,
        deadline: req
            .deadline
            .ok_or_else(|| ValidationError::new("deadline", "Deadline is required."))?,
        reward_structure: bounded("reward_structure", &req.reward_structure, 3, 200, REWARD_SHORT)?,
        industry: bounded("industry", &req.industry, 2, 50, INDUSTRY_SHORT)?,
        skill_level: req
            .skill_level
            .ok_or_else(|| ValidationError::new("skill_level", "Skill level is required."))?,
        rubric: bounded("rubric", &req.rubric, 10, 5000, RUBRIC_SHORT)?,
        data_pack_url: optional_url("data_pack_url", req.data_pack_url.as_deref(), BAD_URL)?,
        logo_url: optional_url("logo_url", req.logo_url.as_deref(), BAD_URL)?,
    })
}

/// Same field rules as creation, applied only to the fields present.
pub fn prepare_patch(req: &UpdateChallengeRequest) -> Result<ChallengePatch, ValidationError> {
    let check = |field, value: &Option<String>, min, max, msg| {
        value
            .as_deref()
            .map(|v| bounded(field, v, min, max, msg))
            .transpose()
    };
    Ok(ChallengePatch {
        title: check("title", &req.title, 5, 100, TITLE_SHORT)?,
        description: check("description", &req.description, 20, 5000, DESCRIPTION_SHORT)?,
        deadline: req.deadline,
        reward_structure: check("reward_structure", &req.reward_structure, 3, 200, REWARD_SHORT)?,
        industry: check("industry", &req.industry, 2, 50, INDUSTRY_SHORT)?,
        skill_level: req.skill_level,
        rubric: check("rubric", &req.rubric, 10, 5000, RUBRIC_SHORT)?,
        data_pack_url: nullable_url("data_pack_url", &req.data_pack_url)?,
        logo_url: nullable_url("logo_url", &req.logo_url)?,
        closed_at: req.closed_at,
    })
}

/// A present-but-empty URL clears the column.
fn nullable_url(
    field: &'static str,
    value: &Option<Option<String>>,
) -> Result<Option<Option<String>>, ValidationError> {
    value
        .as_ref()
        .map(|v| optional_url(field, v.as_deref(), BAD_URL))
        .transpose()
}

pub fn details(challenge: ChallengeWithSponsor, now: OffsetDateTime) -> ChallengeDetails {
    let c = &challenge.challenge;
    ChallengeDetails {
        days_left: days_left(c.deadline, now),
        skill_level_label: skill_level_label(c.skill_level),
        categories: categories(c.industry.as_deref()),
        prize_breakdown: reward_breakdown(c.reward_structure.as_deref()),
        timeline: timeline(c.deadline, now),
        requirements: requirements(c.description.as_deref()),
        challenge,
    }
}
