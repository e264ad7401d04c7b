// daemon.rs — 壁纸守护进程重启模块
// 通过进程名结束旧的 hyprpaper，再以分离方式启动新进程

use async_trait::async_trait;
use log::debug;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command; // tokio 的异步子进程

/// hyprpaper 默认进程名
pub const DEFAULT_DAEMON: &str = "hyprpaper";
/// 按名称结束进程的命令
pub const DEFAULT_KILL_PROGRAM: &str = "killall";
/// 结束与启动前后的等待时间（毫秒）
pub const DEFAULT_SETTLE_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum RestartError {
    /// 子进程本身无法启动（例如程序不在 $PATH 中）
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// 守护进程控制接口
///
/// 目前只有按名称重启的实现；能拿到进程句柄的环境可以换成别的实现。
#[async_trait]
pub trait DaemonControl: Send + Sync {
    async fn restart(&self) -> Result<(), RestartError>;
}

/// 通过进程名控制的守护进程
///
/// 不持有任何句柄：先 `killall -e <name>`，等待，再启动 `<name>`，再等待。
/// 不检查新进程是否真的起来了。
pub struct NamedProcess {
    /// 守护进程的程序名，同时用于结束和启动
    name: String,
    /// 结束进程使用的程序
    kill_program: String,
    /// 结束后、启动后各等待一次
    settle: Duration,
}

impl NamedProcess {
    pub fn new(name: String, kill_program: String, settle: Duration) -> Self {
        Self {
            name,
            kill_program,
            settle,
        }
    }

    /// 结束所有同名进程，忽略退出码（没有在运行的进程时 killall 会返回非零）
    async fn kill(&self) -> Result<(), RestartError> {
        let output = Command::new(&self.kill_program)
            .arg("-e")
            .arg(&self.name)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RestartError::Spawn {
                program: self.kill_program.clone(),
                source,
            })?;

        debug!(
            "{} -e {} exited with {}: {}",
            self.kill_program,
            self.name,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(())
    }

    /// 以分离方式启动守护进程，不等待它退出
    fn launch(&self) -> Result<(), RestartError> {
        // Child 被丢弃时 tokio 不会杀掉子进程
        let child = Command::new(&self.name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| RestartError::Spawn {
                program: self.name.clone(),
                source,
            })?;

        debug!("launched {} (pid {:?})", self.name, child.id());
        Ok(())
    }
}

#[async_trait]
impl DaemonControl for NamedProcess {
    async fn restart(&self) -> Result<(), RestartError> {
        self.kill().await?;
        tokio::time::sleep(self.settle).await;

        self.launch()?;
        tokio::time::sleep(self.settle).await;

        Ok(())
    }
}

#[cfg(test)]
pub mod fake {
    use super::{DaemonControl, RestartError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 只记录调用次数的守护进程
    #[derive(Default)]
    pub struct FakeDaemon {
        pub restarts: AtomicUsize,
        pub fail: bool,
    }

    impl FakeDaemon {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn restart_count(&self) -> usize {
            self.restarts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DaemonControl for FakeDaemon {
        async fn restart(&self) -> Result<(), RestartError> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RestartError::Spawn {
                    program: "fake-daemon".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(())
        }
    }
}
