//! Escrow state machine.
//!
//! Every check runs before the first ledger movement, so a rejected operation leaves
//! balances untouched even before the runtime rolls the transaction back.

use anchor_lang::prelude::*;

use crate::{
    constants::NFT_AMOUNT,
    errors::EscrowError,
    ledger::{Authority, Holding, TokenLedger},
    pda::{custody_address, CustodyAuthority, EscrowAddresses},
    state::EscrowState,
};

/// Terms a seller lists an NFT under
#[derive(Clone, Copy, Debug)]
pub struct Listing {
    pub owner: Pubkey,
    pub nft_mint: Pubkey,
    pub currency_mint: Pubkey,
    pub price: u64,
    /// Total supply of `nft_mint`; only single-unit mints can be listed
    pub nft_supply: u64,
}

/// Accounts taking part in a swap
#[derive(Clone, Copy, Debug)]
pub struct ExchangeKeys {
    pub buyer: Pubkey,
    pub seller: Pubkey,
    pub escrow_state: Pubkey,
    pub custody: Pubkey,
    pub buyer_currency_account: Pubkey,
    pub buyer_nft_account: Pubkey,
    pub seller_currency_account: Pubkey,
}

/// Accounts taking part in a cancellation
#[derive(Clone, Copy, Debug)]
pub struct CancelKeys {
    pub owner: Pubkey,
    pub escrow_state: Pubkey,
    pub custody: Pubkey,
    pub owner_nft_account: Pubkey,
}

/// Locks one NFT unit in custody and returns the record to persist.
///
/// `existing` is the open escrow already stored at the derived address, if any.
pub fn open<L: TokenLedger>(
    ledger: &mut L,
    listing: &Listing,
    existing: Option<&EscrowState>,
    addresses: &EscrowAddresses,
    owner_nft_account: &Pubkey,
) -> Result<EscrowState> {
    require!(
        !existing.is_some_and(EscrowState::is_open),
        EscrowError::DuplicateEscrow
    );
    require_gt!(listing.price, 0, EscrowError::InvalidPrice);
    require_eq!(listing.nft_supply, NFT_AMOUNT, EscrowError::NotNonFungible);

    let source = ledger.holding(owner_nft_account)?;
    require_keys_eq!(source.mint, listing.nft_mint, EscrowError::AccountMismatch);
    require_keys_eq!(source.owner, listing.owner, EscrowError::AccountMismatch);
    require_gte!(source.amount, NFT_AMOUNT, EscrowError::NftNotHeld);

    let custody = ledger.holding(&addresses.custody)?;
    check_custody(&custody, &listing.nft_mint, &addresses.escrow_state)?;
    require_eq!(custody.amount, 0, EscrowError::AccountMismatch);

    ledger.transfer(
        owner_nft_account,
        &addresses.custody,
        NFT_AMOUNT,
        Authority::Holder(&listing.owner),
    )?;

    Ok(EscrowState {
        owner: listing.owner,
        nft_mint: listing.nft_mint,
        currency_mint: listing.currency_mint,
        price: listing.price,
        state_bump: addresses.state_bump,
        token_bump: addresses.token_bump,
    })
}

/// Pays the seller, releases the NFT to the buyer and closes custody.
///
/// The caller destroys the state record once this returns.
pub fn exchange<L: TokenLedger>(
    ledger: &mut L,
    state: Option<&EscrowState>,
    keys: &ExchangeKeys,
) -> Result<()> {
    let state = open_escrow(state)?;
    let (authority, held) = verify_custody(ledger, state, &keys.escrow_state, &keys.custody)?;
    require_keys_eq!(keys.seller, state.owner, EscrowError::AccountMismatch);

    let payment = ledger.holding(&keys.buyer_currency_account)?;
    require_keys_eq!(payment.mint, state.currency_mint, EscrowError::AccountMismatch);
    require_keys_eq!(payment.owner, keys.buyer, EscrowError::AuthorizationFailure);

    let proceeds = ledger.holding(&keys.seller_currency_account)?;
    require_keys_eq!(proceeds.mint, state.currency_mint, EscrowError::AccountMismatch);
    require_keys_eq!(proceeds.owner, state.owner, EscrowError::AccountMismatch);

    let receiver = ledger.holding(&keys.buyer_nft_account)?;
    require_keys_eq!(receiver.mint, state.nft_mint, EscrowError::AccountMismatch);
    require_keys_eq!(receiver.owner, keys.buyer, EscrowError::AccountMismatch);

    require_gte!(payment.amount, state.price, EscrowError::InsufficientFunds);

    ledger.transfer(
        &keys.buyer_currency_account,
        &keys.seller_currency_account,
        state.price,
        Authority::Holder(&keys.buyer),
    )?;
    ledger.transfer(
        &keys.custody,
        &keys.buyer_nft_account,
        held,
        Authority::Custody(&authority),
    )?;
    ledger.close_account(&keys.custody, &keys.seller, Authority::Custody(&authority))
}

/// Returns the NFT to its owner and closes custody.
///
/// The caller destroys the state record once this returns.
pub fn cancel<L: TokenLedger>(
    ledger: &mut L,
    state: Option<&EscrowState>,
    keys: &CancelKeys,
) -> Result<()> {
    let state = open_escrow(state)?;
    require_keys_eq!(keys.owner, state.owner, EscrowError::AuthorizationFailure);
    let (authority, held) = verify_custody(ledger, state, &keys.escrow_state, &keys.custody)?;

    let receiver = ledger.holding(&keys.owner_nft_account)?;
    require_keys_eq!(receiver.mint, state.nft_mint, EscrowError::AccountMismatch);
    require_keys_eq!(receiver.owner, state.owner, EscrowError::AccountMismatch);

    ledger.transfer(
        &keys.custody,
        &keys.owner_nft_account,
        held,
        Authority::Custody(&authority),
    )?;
    ledger.close_account(&keys.custody, &keys.owner, Authority::Custody(&authority))
}

fn open_escrow(state: Option<&EscrowState>) -> Result<&EscrowState> {
    state
        .filter(|state| state.is_open())
        .ok_or_else(|| error!(EscrowError::EscrowNotFound))
}

/// Re-derives both addresses from the record and checks custody holds the NFT.
///
/// Returns the custody balance: units sent in by third parties leave with the NFT,
/// so custody can always be emptied and closed.
fn verify_custody<L: TokenLedger>(
    ledger: &L,
    state: &EscrowState,
    escrow_state: &Pubkey,
    custody: &Pubkey,
) -> Result<(CustodyAuthority, u64)> {
    let authority = CustodyAuthority::for_escrow(state, escrow_state)?;
    let expected = custody_address(&state.owner, &state.nft_mint, state.token_bump)?;
    require_keys_eq!(*custody, expected, EscrowError::AccountMismatch);

    let holding = ledger.holding(custody)?;
    check_custody(&holding, &state.nft_mint, &authority.address())?;
    require_gte!(holding.amount, NFT_AMOUNT, EscrowError::AccountMismatch);
    Ok((authority, holding.amount))
}

fn check_custody(holding: &Holding, nft_mint: &Pubkey, authority: &Pubkey) -> Result<()> {
    require_keys_eq!(holding.mint, *nft_mint, EscrowError::AccountMismatch);
    require_keys_eq!(holding.owner, *authority, EscrowError::AccountMismatch);
    Ok(())
}
