use std::process::ExitCode;

pub enum Exit<T> {
    Ok,
    Err(T),
}

impl<T: Into<i32> + std::fmt::Display> std::process::Termination for Exit<T> {
    fn report(self) -> ExitCode {
        match self {
            Exit::Ok => ExitCode::SUCCESS,
            Exit::Err(err) => {
                eprintln!("Error: {}", err);
                let code: i32 = err.into();
                ExitCode::from(code as u8)
            },
        }
    }
}

#[async_std::main]
async fn main() -> Exit<photo_attic::Error> {
    match photo_attic::main().await {
        Ok(_) => Exit::Ok,
        Err(err) => Exit::Err(err),
    }
}
