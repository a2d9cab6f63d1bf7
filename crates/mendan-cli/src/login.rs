//! The sign-in form.

use mendan_core::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
  UserId,
  Password,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
  pub user_id:  String,
  pub password: String,
  pub focus:    LoginField,
  /// Shown under the form after a refused attempt.
  pub error:    Option<String>,
  submitting:   bool,
}

impl Default for LoginForm {
  fn default() -> Self {
    Self {
      user_id:    String::new(),
      password:   String::new(),
      focus:      LoginField::UserId,
      error:      None,
      submitting: false,
    }
  }
}

impl LoginForm {
  pub fn new() -> Self { Self::default() }

  /// A blank form that opens with `message` already shown.
  pub fn with_message(message: impl Into<String>) -> Self {
    Self {
      error: Some(message.into()),
      ..Self::default()
    }
  }

  pub fn is_submitting(&self) -> bool { self.submitting }

  pub fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      LoginField::UserId => LoginField::Password,
      LoginField::Password => LoginField::UserId,
    };
  }

  pub fn push_char(&mut self, c: char) {
    match self.focus {
      LoginField::UserId if c.is_ascii_digit() => self.user_id.push(c),
      LoginField::UserId => {}
      LoginField::Password => self.password.push(c),
    }
  }

  pub fn pop_char(&mut self) {
    match self.focus {
      LoginField::UserId => self.user_id.pop(),
      LoginField::Password => self.password.pop(),
    };
  }

  /// Validate the credentials. On failure the reason is stored in `error`.
  pub fn begin_submit(&mut self) -> Option<(i64, String)> {
    if self.submitting {
      return None;
    }
    let user_id = match self.user_id.trim().parse::<i64>() {
      Ok(id) if id >= 1 => id,
      _ => {
        self.error = Some("Enter a valid user id.".into());
        return None;
      }
    };
    if self.password.is_empty() {
      self.error = Some("Enter your password.".into());
      return None;
    }
    self.error = None;
    self.submitting = true;
    Some((user_id, self.password.clone()))
  }

  /// Record a refused sign-in. The password is cleared.
  pub fn fail(&mut self, err: &ApiError) {
    self.submitting = false;
    self.password.clear();
    self.focus = LoginField::Password;
    self.error = Some(
      err
        .detail()
        .map(str::to_owned)
        .unwrap_or_else(|| "Could not sign in".into()),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn user_id_must_be_positive() {
    let mut form = LoginForm::new();
    form.password = "pw".into();
    for bad in ["", "0", "abc"] {
      form.user_id = bad.into();
      assert!(form.begin_submit().is_none(), "{bad:?}");
      assert_eq!(form.error.as_deref(), Some("Enter a valid user id."));
    }
  }

  #[test]
  fn password_is_required() {
    let mut form = LoginForm::new();
    form.user_id = "3".into();
    assert!(form.begin_submit().is_none());
    assert_eq!(form.error.as_deref(), Some("Enter your password."));

    form.password = "secret".into();
    assert_eq!(form.begin_submit(), Some((3, "secret".into())));
    assert!(form.is_submitting());
    assert!(form.error.is_none());
  }

  #[test]
  fn user_id_accepts_digits_only() {
    let mut form = LoginForm::new();
    for c in "1a2-".chars() {
      form.push_char(c);
    }
    assert_eq!(form.user_id, "12");
  }

  #[test]
  fn failure_shows_detail_or_fallback() {
    let mut form = LoginForm::new();
    form.password = "wrong".into();
    form.fail(&ApiError::Unauthorized {
      detail: Some("Incorrect user id or password".into()),
    });
    assert_eq!(form.error.as_deref(), Some("Incorrect user id or password"));
    assert!(form.password.is_empty());

    form.fail(&ApiError::Transport {
      offline: true,
      message: "refused".into(),
    });
    assert_eq!(form.error.as_deref(), Some("Could not sign in"));
  }
}
