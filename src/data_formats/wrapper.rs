use serde::{Deserialize, Serialize};

use super::FormErrors;

#[derive(Debug, Deserialize, Serialize)]
pub struct UserWrapper<T> {
    pub user: T,
}

impl<T> UserWrapper<T> {
    pub fn wrap_with_user_data(request: T) -> UserWrapper<T> {
        UserWrapper { user: request }
    }
}

/// A form as it is (re)displayed: its values and any field errors.
#[derive(Debug, Deserialize, Serialize)]
pub struct FormWrapper<T> {
    pub form: T,
    #[serde(default)]
    pub errors: FormErrors,
}

impl<T> FormWrapper<T> {
    pub fn unbound(form: T) -> FormWrapper<T> {
        FormWrapper {
            form,
            errors: FormErrors::default(),
        }
    }
}

impl<T: Serialize> FormWrapper<T> {
    /// The submitted values paired with their errors, ready for a 422 response.
    pub fn rejected(form: &T, errors: FormErrors) -> FormWrapper<serde_json::Value> {
        FormWrapper {
            form: serde_json::to_value(form).unwrap_or_default(),
            errors,
        }
    }
}
