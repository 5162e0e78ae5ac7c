use storefront::{Session, Storefront, setup_environment};

/// One-shot order sync for a user given by `SYNC_USER_ID` / `SYNC_USER_EMAIL`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    let config = setup_environment()?;

    tracing::info!(work_dir = %config.work_dir, "Storefront starting...");

    // 2. 打开店面
    let store = Storefront::open(config)?;

    let (Ok(user_id), Ok(email)) = (
        std::env::var("SYNC_USER_ID"),
        std::env::var("SYNC_USER_EMAIL"),
    ) else {
        tracing::info!("SYNC_USER_ID / SYNC_USER_EMAIL not set, nothing to sync");
        return Ok(());
    };

    // 3. 登录并关联远程客户
    store.sign_in(Session::new(user_id, email))?;
    store.link_customer().await?;

    // 4. 同步订单
    let report = store.sync_orders().await?;
    tracing::info!(
        pushed = report.pushed,
        push_failed = report.push_failed,
        pulled = report.pulled,
        rejected = report.rejected,
        added = report.merge.added,
        updated = report.merge.updated,
        "Sync complete"
    );
    Ok(())
}
