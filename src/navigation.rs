use serde::Serialize;

/// Screens the core can force the UI onto.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    Register,
    Login,
    UserDashboard,
    AdminDashboard,
    ThankYou,
}
