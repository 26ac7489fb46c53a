use crate::sink::Notice;

/// What a guard wants done with the protected subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(Redirect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    /// Shown once, before navigating
    pub notice: Option<Notice>,
    /// Wipe the session (and its persisted keys) before navigating
    pub clear_session: bool,
}

impl GuardDecision {
    pub fn redirect(path: impl Into<String>) -> Self {
        GuardDecision::Redirect(Redirect {
            path: path.into(),
            notice: None,
            clear_session: false,
        })
    }

    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }

    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            GuardDecision::Render => None,
            GuardDecision::Redirect(r) => Some(&r.path),
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            GuardDecision::Render => None,
            GuardDecision::Redirect(r) => r.notice.as_ref(),
        }
    }

    pub(crate) fn with_notice(self, notice: Notice) -> Self {
        match self {
            GuardDecision::Redirect(r) => GuardDecision::Redirect(Redirect {
                notice: Some(notice),
                ..r
            }),
            render => render,
        }
    }

    pub(crate) fn clearing_session(self) -> Self {
        match self {
            GuardDecision::Redirect(r) => GuardDecision::Redirect(Redirect {
                clear_session: true,
                ..r
            }),
            render => render,
        }
    }
}
