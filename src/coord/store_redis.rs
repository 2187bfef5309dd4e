use crate::coord::store::CoordinationStore;
use anyhow::{Context, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

const COMPARE_AND_DELETE: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

#[derive(Clone)]
pub struct RedisCoordinationStore {
    conn: MultiplexedConnection,
    op_timeout: Duration,
    release_script: redis::Script,
}

impl RedisCoordinationStore {
    pub async fn connect(client: &redis::Client, op_timeout: Duration) -> Result<Self> {
        let conn = tokio::time::timeout(op_timeout, client.get_multiplexed_async_connection())
            .await
            .context("timed out connecting to redis")??;
        Ok(Self::from_connection(conn, op_timeout))
    }

    pub fn from_connection(conn: MultiplexedConnection, op_timeout: Duration) -> Self {
        Self {
            conn,
            op_timeout,
            release_script: redis::Script::new(COMPARE_AND_DELETE),
        }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .with_context(|| format!("redis {} timed out after {:?}", op, self.op_timeout))?
            .with_context(|| format!("redis {} failed", op))
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

#[async_trait::async_trait]
impl CoordinationStore for RedisCoordinationStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded("GET", async move { conn.get(key).await }).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = self
            .bounded("SET PX", async move {
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("PX")
                    .arg(ttl_millis(ttl))
                    .query_async(&mut conn)
                    .await
            })
            .await?;
        Ok(())
    }

    async fn set_if_absent_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = self
            .bounded("SET NX PX", async move {
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("PX")
                    .arg(ttl_millis(ttl))
                    .query_async(&mut conn)
                    .await
            })
            .await?;
        Ok(reply.is_some())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let script = self.release_script.clone();
        let deleted: i64 = self
            .bounded("compare-and-delete", async move {
                let mut invocation = script.key(key);
                invocation.arg(expected);
                invocation.invoke_async(&mut conn).await
            })
            .await?;
        Ok(deleted > 0)
    }
}
