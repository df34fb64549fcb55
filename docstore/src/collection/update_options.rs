/// Controls how many matching documents an update touches.
///
/// `multi = true` applies the patch to every match; `false` to the first
/// match in insertion order only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    multi: bool,
}

impl UpdateOptions {
    pub fn new(multi: bool) -> Self {
        Self { multi }
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }
}

/// Controls how many matching documents a remove deletes.
///
/// There is no implicit default at the facade: every remove states whether
/// it is a bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOptions {
    multi: bool,
}

impl RemoveOptions {
    pub fn new(multi: bool) -> Self {
        Self { multi }
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }
}

/// Update every match.
pub fn update_all() -> UpdateOptions {
    UpdateOptions::new(true)
}

/// Update the first match only.
pub fn just_once() -> UpdateOptions {
    UpdateOptions::new(false)
}

pub fn remove_all() -> RemoveOptions {
    RemoveOptions::new(true)
}

pub fn remove_one() -> RemoveOptions {
    RemoveOptions::new(false)
}
