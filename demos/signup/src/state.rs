use serde::Serialize;

use crate::action::{Applicant, Rejection};

#[derive(Clone, Debug, Default, Serialize)]
pub struct SignupState {
    pub members: Vec<Applicant>,
    pub rejections: Vec<Rejection>,
}
