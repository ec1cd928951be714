//! Backend auth code.
//!
//! A single screen that fetches a one-time token over WiFi and shows it, so
//! the owner can pair the badge on the web page.

use badge_kernel::{
    App, Context, FnModule, LaunchArgs, Reply, Screen,
    error::AppError,
    hal::{Color, TextStyle},
};

use crate::AUTH_APP;

/// Shown when the backend gave no token.
pub const NO_CODE: &str = "Could not get an auth code from server";

/// Auth code screen.
#[derive(Debug, Default)]
pub struct AuthScreen;

impl Screen for AuthScreen {
    fn update(&mut self, cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
        // An interrupted WiFi wait resurfaces on the next idle.
        let code = cx.auth_code().unwrap_or_else(|_| {
            tracing::warn!("auth code request interrupted");
            None
        });

        let display = cx.display.as_mut();
        display.fill(Color::Background);
        display.text(code.as_deref().unwrap_or(NO_CODE), 0, 0, TextStyle::wrapped());
        display.update();
        None
    }
}

/// Build the auth app.
pub fn build(screen: usize, args: &LaunchArgs) -> Result<App, AppError> {
    App::new(AUTH_APP, 1, vec![Box::new(AuthScreen)], screen, args)
}

/// Registry module for the auth app.
pub fn module() -> FnModule {
    FnModule::new(AUTH_APP, build)
}
