pub mod statefile;
pub mod stdio;

use async_trait::async_trait;

use crate::error::BindResult;

#[async_trait]
pub trait Backend {
    async fn run_forever(self) -> BindResult<()>;
}
