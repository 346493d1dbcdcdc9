// ネットワーク状態監視モジュール
//
// 現在のオンライン/オフライン状態を保持し、状態遷移を購読チャネルで
// 通知する。状態の変化はホスト環境（UIシェルや接続プローブ）が
// set_statusで報告する。

use log::{info, warn};
use tokio::sync::watch;

/// ネットワーク接続状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
    Unknown,
}

/// ネットワーク状態モニター
///
/// Onlineのみをオンライン扱いとし、Unknownは安全側に倒して
/// オフラインとして扱う。
pub struct NetworkMonitor {
    status: watch::Sender<NetworkStatus>,
}

impl NetworkMonitor {
    /// モニターを初期化する
    ///
    /// # 引数
    /// * `initial` - 初期状態（起動直後はUnknownが妥当）
    pub fn new(initial: NetworkStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { status: tx }
    }

    /// 現在の接続状態を取得する
    pub fn current_status(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    /// オンラインかどうかを判定する
    pub fn is_online(&self) -> bool {
        matches!(self.current_status(), NetworkStatus::Online)
    }

    /// ホスト環境から接続状態の変化を報告する
    ///
    /// # 引数
    /// * `status` - 新しい接続状態
    pub fn set_status(&self, status: NetworkStatus) {
        let previous = self.current_status();
        if previous == status {
            return;
        }

        match status {
            NetworkStatus::Online => info!("ネットワーク: オンラインになりました"),
            NetworkStatus::Offline => warn!("ネットワーク: オフラインになりました"),
            NetworkStatus::Unknown => warn!("ネットワーク: 状態が不明になりました"),
        }

        self.status.send_replace(status);
    }

    /// 状態遷移の購読チャネルを取得する
    ///
    /// 返されたレシーバーをドロップすることで購読が解除される。
    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }
}
