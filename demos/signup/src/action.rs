//! Signup actions and the validated `signup/register` creator

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use vetted_dispatch::{Action, Unit, ValidatableCreator};

pub const REGISTER: &str = "signup/register";
pub const REGISTER_REJECTED: &str = "signup/register/rejected";

#[derive(Action, Clone, Debug)]
pub enum SignupAction {
    #[action(unit)]
    Register(Unit<Applicant>),
    #[action(unit)]
    Rejected(Unit<Rejection>),
    #[action(kind = "signup/reset")]
    Reset,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Applicant {
    pub name: String,
    pub age: i32,
    pub email: String,
}

/// Parses `name:age:email`
impl FromStr for Applicant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(name), Some(age), Some(email)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected name:age:email, got `{s}`"));
        };
        let age = age
            .trim()
            .parse::<i32>()
            .map_err(|e| format!("invalid age `{age}`: {e}"))?;
        Ok(Applicant {
            name: name.to_string(),
            age,
            email: email.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rejection {
    pub field: &'static str,
    pub reason: String,
}

impl Rejection {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Build the validated register creator.
///
/// The email check sleeps for `lookup` to stand in for a directory lookup.
pub fn register(
    taken: Arc<Vec<String>>,
    lookup: Duration,
) -> vetted_dispatch::Result<ValidatableCreator<Applicant, Rejection>> {
    ValidatableCreator::new((REGISTER, REGISTER_REJECTED), move |applicant: Applicant| {
        let taken = taken.clone();
        async move { check(applicant, &taken, lookup).await }
    })
}

async fn check(
    applicant: Applicant,
    taken: &[String],
    lookup: Duration,
) -> Result<Option<Applicant>, Rejection> {
    let name = applicant.name.trim();
    if name.is_empty() {
        return Err(Rejection::new("name", "must not be blank"));
    }
    if !(0..150).contains(&applicant.age) {
        return Err(Rejection::new("age", format!("{} is out of range", applicant.age)));
    }

    let email = applicant.email.trim().to_ascii_lowercase();
    if !email.contains('@') {
        return Err(Rejection::new("email", "missing @"));
    }
    tokio::time::sleep(lookup).await;
    if taken.iter().any(|t| t.eq_ignore_ascii_case(&email)) {
        return Err(Rejection::new("email", format!("{email} is already registered")));
    }

    if name == applicant.name && email == applicant.email {
        return Ok(None);
    }
    Ok(Some(Applicant {
        name: name.to_string(),
        email,
        ..applicant
    }))
}
