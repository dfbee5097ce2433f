use crate::action::SignupAction;
use crate::state::SignupState;

pub fn reducer(state: &mut SignupState, action: SignupAction) -> bool {
    match action {
        SignupAction::Register(unit) => {
            state.members.push(unit.into_payload());
            true
        }
        SignupAction::Rejected(unit) => {
            tracing::info!(
                field = unit.payload().field,
                reason = %unit.payload().reason,
                "signup rejected"
            );
            state.rejections.push(unit.into_payload());
            true
        }
        SignupAction::Reset => {
            let changed = !state.members.is_empty() || !state.rejections.is_empty();
            *state = SignupState::default();
            changed
        }
    }
}
