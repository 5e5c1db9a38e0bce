mod app;
mod widgets;

use app::App;

fn main() -> iced::Result {
    init_tracing();

    iced::application("Trim", App::update, App::view)
        .subscription(App::subscription)
        .run_with(App::boot)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
