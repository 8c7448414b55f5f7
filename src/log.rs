use std::fmt::Debug;

pub trait LogErr {
    fn log_err_with(self, additional: &str) -> Self;
}

impl<T, E> LogErr for Result<T, E>
where
    E: Debug + Send + Sync + 'static,
{
    fn log_err_with(self, additional: &str) -> Result<T, E> {
        self.inspect_err(|error| log::error!("{additional}: {error:?}"))
    }
}
