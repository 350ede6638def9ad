use crate::exec::ExecError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no autorun program was found on the medium")]
    ProgramNotFound,

    #[error(transparent)]
    Exec(#[from] ExecError),
}
