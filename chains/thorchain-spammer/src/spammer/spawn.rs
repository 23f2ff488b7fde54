use super::{SpamContext, ThorSpammer, WorkerSettings};
use crate::coins::{format_coins, random_coins_up_to};
use crate::error::SpawnError;
use crate::tx::TxSigner;
use core_logic::traits::{Identity, Keystore};
use std::sync::Arc;
use tracing::{info, warn};

/// Turns one keystore identity into a ready worker.
///
/// Chain lookups go through the query gate. A missing account or an empty
/// send slice is counted in the shared stats and reported as a non-fatal
/// [`SpawnError`]; a key that does not decrypt is fatal.
pub async fn spawn_spammer(
    index: usize,
    identity: &Identity,
    password: &str,
    keystore: &dyn Keystore,
    ctx: Arc<SpamContext>,
    settings: Arc<WorkerSettings>,
) -> Result<ThorSpammer, SpawnError> {
    let account = match ctx
        .gate
        .run(|| ctx.client.get_account(&identity.address))
        .await
    {
        Ok(account) => account,
        Err(e) => {
            info!("Iteration {}: Account not found, skipping", index);
            ctx.stats.add_account_not_found();
            return Err(SpawnError::AccountNotFound {
                name: identity.name.clone(),
                reason: e.to_string(),
            });
        }
    };

    let send_coins = random_coins_up_to(&account.coins, settings.divide_by, &mut rand::thread_rng());
    if send_coins.is_empty() {
        info!("Iteration {}: No coins to send, skipping", index);
        ctx.stats.add_no_coins_to_send();
        return Err(SpawnError::NoSendableCoins {
            name: identity.name.clone(),
        });
    }

    info!("Spammer {}: Finding sequence...", index);
    let sequence = match ctx
        .gate
        .run(|| ctx.client.get_account(&identity.address))
        .await
    {
        Ok(latest) => latest.sequence,
        Err(e) => {
            // The first failed send will resync it
            warn!(
                "Spammer {}: Sequence error, starting from {}: {}",
                index, account.sequence, e
            );
            account.sequence
        }
    };

    let key = keystore.decrypt_key(&identity.name, password).await?;
    let signer = TxSigner::from_hex(&key.private_key)?;

    info!(
        "Spammer {}: {} ready at sequence {}, sending {}",
        index,
        identity.name,
        sequence,
        format_coins(&send_coins)
    );

    Ok(ThorSpammer::new(
        index,
        identity.name.clone(),
        identity.address.clone(),
        signer,
        account.account_number,
        sequence,
        send_coins,
        ctx,
        settings,
    ))
}
