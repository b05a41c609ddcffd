//! The in-memory world a configuration describes, and settlement against it.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use alloy_signer_local::PrivateKeySigner;
use transfers::{TransferError, TransferIntent, Transferred, UnixTimestamp};
use transfers_evm::client::{sign_eip2612_permit, sign_intent, sign_permit2_transfer};
use transfers_evm::contract::{
    Eip2612SignatureTransferData, Permit2SignatureTransferData, PermitTransferFrom,
    SignatureTransferDetails, TokenPermissions,
};
use transfers_evm::{Call, Chain, Erc20, Permit2, Transfers, UniversalRouter};

use crate::config::{Method, SettlementConfig, TokenConfig, WorldConfig};
use crate::error::CliError;

/// The engine as deployed by the runner.
pub type Engine = Transfers<Permit2, UniversalRouter>;

/// A configured world: chain state, the engine and the known signing keys.
#[derive(Debug)]
pub struct World {
    chain: Chain,
    engine: Engine,
    signers: HashMap<Address, PrivateKeySigner>,
    permit_nonce: u64,
}

fn required<T>(value: Option<T>, method: Method, field: &'static str) -> Result<T, CliError> {
    value.ok_or(CliError::MissingField {
        method: method.as_str(),
        field,
    })
}

fn deploy_token(chain: &mut Chain, token: &TokenConfig) -> Result<(), CliError> {
    let mut erc20 = if token.wrapped {
        Erc20::wrapped_native(token.name.as_str())
    } else {
        Erc20::new(token.name.as_str())
    }
    .with_transfer_fee(token.transfer_fee_bps);
    if let Some(version) = &token.permit_version {
        erc20 = erc20.with_permit(version.as_str());
    }
    chain.deploy_token(token.address, erc20);

    for (&holder, &amount) in &token.balances {
        let credited = if token.wrapped {
            chain.fund(holder, amount);
            chain.deposit(token.address, holder, amount)
        } else {
            chain.mint(token.address, holder, amount)
        };
        credited.map_err(|data| {
            CliError::Setup(format!(
                "cannot credit {holder} with {amount} of {}: {data}",
                token.address
            ))
        })?;
    }
    Ok(())
}

impl World {
    /// Builds the world: balances, tokens, pools, the engine, operators and
    /// allowances, in that order.
    ///
    /// # Errors
    ///
    /// [`CliError::Key`] for an unparsable signer key, [`CliError::Setup`]
    /// if a balance or allowance cannot be applied.
    pub fn build(config: &WorldConfig) -> Result<Self, CliError> {
        let timestamp = config
            .timestamp
            .map_or_else(UnixTimestamp::now, UnixTimestamp::from_secs);
        let mut chain = Chain::new(config.chain_id, timestamp);
        let contracts = config.contracts;

        let signers = config
            .signers
            .iter()
            .map(|key| {
                key.trim()
                    .parse::<PrivateKeySigner>()
                    .map(|signer| (signer.address(), signer))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        for (&account, &amount) in &config.native {
            chain.fund(account, amount);
        }
        for token in &config.tokens {
            deploy_token(&mut chain, token)?;
        }

        let router = config.pools.iter().cloned().fold(
            UniversalRouter::new(contracts.router, contracts.wrapped_native),
            UniversalRouter::with_pool,
        );
        let engine = Transfers::deploy(
            &mut chain,
            contracts.engine,
            contracts.wrapped_native,
            Permit2::new(contracts.permit2),
            router,
            contracts.owner,
        );
        for operator in &config.operators {
            engine.register_operator_with_fee_destination(
                &mut chain,
                operator.address,
                operator.fee_destination.unwrap_or(operator.address),
            );
        }
        for approval in &config.approvals {
            chain
                .approve(approval.token, approval.owner, approval.spender, approval.amount)
                .map_err(|data| {
                    CliError::Setup(format!("cannot approve {}: {data}", approval.token))
                })?;
        }

        if engine
            .storage(&chain)
            .is_none_or(|storage| storage.operators().is_empty())
        {
            tracing::warn!("No operators registered; every settlement will be rejected");
        }
        tracing::info!(
            chain_id = config.chain_id,
            timestamp = %timestamp,
            engine = %contracts.engine,
            tokens = config.tokens.len(),
            pools = config.pools.len(),
            operators = engine.operator_count(&chain),
            signers = signers.len(),
            "World ready"
        );
        Ok(Self {
            chain,
            engine,
            signers,
            permit_nonce: 0,
        })
    }

    /// Current chain state.
    #[must_use]
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    /// The deployed engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    fn signer(&self, address: Address) -> Result<&PrivateKeySigner, CliError> {
        self.signers
            .get(&address)
            .ok_or(CliError::UnknownSigner(address))
    }

    /// Signs `settlement.intent` with its operator's key, produces whatever
    /// payer authorization the method needs, and submits it.
    ///
    /// # Errors
    ///
    /// [`CliError::Settlement`] when the engine rejects the settlement;
    /// other variants when the settlement cannot be prepared.
    pub fn settle(&mut self, settlement: &SettlementConfig) -> Result<Transferred, CliError> {
        let method = settlement.method;
        let payer = settlement.payer;
        let intent = sign_intent(
            self.signer(settlement.intent.operator)?,
            settlement.intent.clone(),
            self.chain.chain_id(),
            payer,
            self.engine.address(),
        )?;
        let needed = intent
            .needed_amount()
            .ok_or(TransferError::AmountOverflow)?;
        let call = Call::with_value(payer, settlement.value);
        if !self.engine.is_operator(&self.chain, &intent.operator) {
            tracing::warn!(operator = %intent.operator, "Intent operator is not registered");
        }
        tracing::debug!(method = %method, payer = %payer, id = %intent.id, "Submitting settlement");

        let result = match method {
            Method::TransferNative => self.engine.transfer_native(&mut self.chain, call, &intent),
            Method::TransferToken => {
                let data = self.permit2_data(payer, intent.recipient_currency, needed, &intent)?;
                self.engine
                    .transfer_token(&mut self.chain, payer, &intent, &data)
            }
            Method::TransferTokenPreApproved => {
                self.engine
                    .transfer_token_pre_approved(&mut self.chain, payer, &intent)
            }
            Method::SubsidizedTransferToken => {
                let signature = sign_eip2612_permit(
                    self.signer(payer)?,
                    &self.chain,
                    intent.recipient_currency,
                    payer,
                    self.engine.address(),
                    needed,
                    intent.deadline,
                )?;
                let data = Eip2612SignatureTransferData {
                    owner: payer,
                    signature,
                };
                let sender = settlement.relayer.unwrap_or(payer);
                self.engine
                    .subsidized_transfer_token(&mut self.chain, sender, &intent, &data)
            }
            Method::WrapAndTransfer => {
                self.engine
                    .wrap_and_transfer(&mut self.chain, call, &intent)
            }
            Method::UnwrapAndTransfer => {
                let wrapped = self.engine.wrapped_native();
                let data = self.permit2_data(payer, wrapped, needed, &intent)?;
                self.engine
                    .unwrap_and_transfer(&mut self.chain, payer, &intent, &data)
            }
            Method::UnwrapAndTransferPreApproved => {
                self.engine
                    .unwrap_and_transfer_pre_approved(&mut self.chain, payer, &intent)
            }
            Method::SwapAndTransferNative => self.engine.swap_and_transfer_native(
                &mut self.chain,
                call,
                &intent,
                settlement.pool_fee,
            ),
            Method::SwapAndTransferToken => {
                let token_in = required(settlement.token_in, method, "token_in")?;
                let max_in = required(settlement.max_in, method, "max_in")?;
                let data = self.permit2_data(payer, token_in, max_in, &intent)?;
                self.engine.swap_and_transfer_token(
                    &mut self.chain,
                    payer,
                    &intent,
                    &data,
                    settlement.pool_fee,
                )
            }
            Method::SwapAndTransferTokenPreApproved => {
                let token_in = required(settlement.token_in, method, "token_in")?;
                let max_in = required(settlement.max_in, method, "max_in")?;
                self.engine.swap_and_transfer_token_pre_approved(
                    &mut self.chain,
                    payer,
                    &intent,
                    token_in,
                    max_in,
                    settlement.pool_fee,
                )
            }
        };
        Ok(result?)
    }

    /// A Permit2 transfer of `amount` of `token` from `payer` to the engine,
    /// valid until the intent deadline, under a fresh nonce.
    fn permit2_data(
        &mut self,
        payer: Address,
        token: Address,
        amount: U256,
        intent: &TransferIntent,
    ) -> Result<Permit2SignatureTransferData, CliError> {
        self.permit_nonce += 1;
        let permit = PermitTransferFrom {
            permitted: TokenPermissions { token, amount },
            nonce: U256::from(self.permit_nonce),
            deadline: intent.deadline.into(),
        };
        let engine = self.engine.address();
        let signature = sign_permit2_transfer(
            self.signer(payer)?,
            self.engine.authority(),
            self.chain.chain_id(),
            engine,
            &permit,
        )?;
        Ok(Permit2SignatureTransferData {
            permit,
            transferDetails: SignatureTransferDetails {
                to: engine,
                requestedAmount: amount,
            },
            signature,
        })
    }
}
