//! Solidity definitions shared by the engine and its collaborators.
//!
//! Contains the ABI surface the engine speaks:
//! - [`ITransfers`]: settlement events and custom errors
//! - [`IntentDigest`]: the `abi.encode` layout of a signed intent
//! - Permit2 calldata structs ([`PermitTransferFrom`], [`SignatureTransferDetails`])
//!   and the engine's authorization payloads
//! - [`typed`]: EIP-712 typed-data structs for Permit2 and EIP-2612 permits
//! - [`IUniversalRouter`]: command inputs and faults of the swap venue
//! - [`IERC20Errors`]: token faults raised by the in-memory ERC-20 ledger

use alloy_sol_types::sol;

sol! {
    /// Events and custom errors of the settlement engine.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface ITransfers {
        event Transferred(
            address indexed operator,
            bytes16 id,
            address recipient,
            address sender,
            uint256 spentAmount,
            address spentCurrency
        );
        event OperatorRegistered(address operator, address feeDestination);
        event OperatorUnregistered(address operator);
        event Paused(address account);
        event Unpaused(address account);

        error InvalidSignature();
        error ExpiredIntent();
        error NullRecipient();
        error AlreadyProcessed();
        error OperatorNotRegistered();
        error InvalidNativeAmount(int256 difference);
        error InsufficientBalance(uint256 difference);
        error InsufficientAllowance(uint256 difference);
        error InvalidTransferDetails();
        error AmountOverflow();
        error IncorrectCurrency(address attemptedCurrency);
        error InexactTransfer();
        error NativeTransferFailed(address recipient, uint256 amount, bool isRefund, bytes data);
        error SwapFailedString(string reason);
        error SwapFailedBytes(bytes reason);
        error ReentrancyGuardReentrantCall();
        error EnforcedPause();
        error ExpectedPause();
        error Unauthorized(address account);
    }
}

sol! {
    /// `abi.encode` layout hashed to produce an intent's signing digest.
    ///
    /// Field order is the wire contract with off-chain intent authors and
    /// MUST NOT change.
    #[derive(Debug)]
    struct IntentDigest {
        uint256 recipientAmount;
        uint256 deadline;
        address recipient;
        address recipientCurrency;
        address refundDestination;
        uint256 feeAmount;
        bytes16 id;
        address operator;
        uint256 chainId;
        address sender;
        address transfers;
    }
}

sol! {
    /// Token and maximum amount covered by a Permit2 signature.
    #[derive(Debug, PartialEq, Eq)]
    struct TokenPermissions {
        address token;
        uint256 amount;
    }

    /// Permit2 signature-transfer permit, as passed in calldata.
    #[derive(Debug, PartialEq, Eq)]
    struct PermitTransferFrom {
        TokenPermissions permitted;
        uint256 nonce;
        uint256 deadline;
    }

    /// Destination and amount of a Permit2 signature transfer.
    #[derive(Debug, PartialEq, Eq)]
    struct SignatureTransferDetails {
        address to;
        uint256 requestedAmount;
    }

    /// Transfer-authority payload accepted by signature-authorized entry points.
    #[derive(Debug, PartialEq, Eq)]
    struct Permit2SignatureTransferData {
        PermitTransferFrom permit;
        SignatureTransferDetails transferDetails;
        bytes signature;
    }

    /// EIP-2612 permit payload accepted by the subsidized entry point.
    #[derive(Debug, PartialEq, Eq)]
    struct Eip2612SignatureTransferData {
        address owner;
        bytes signature;
    }
}

/// EIP-712 typed-data structs.
///
/// Kept apart from the calldata structs because the Permit2 typed message
/// shares the `PermitTransferFrom` name but additionally binds the spender.
pub mod typed {
    use alloy_sol_types::sol;

    sol! {
        /// EIP-712 token permissions.
        #[derive(Debug)]
        struct TokenPermissions {
            address token;
            uint256 amount;
        }

        /// EIP-712 Permit2 `PermitTransferFrom`. The spender is the caller of
        /// `permitTransferFrom`, never part of calldata.
        #[derive(Debug)]
        struct PermitTransferFrom {
            TokenPermissions permitted;
            address spender;
            uint256 nonce;
            uint256 deadline;
        }

        /// EIP-712 EIP-2612 `Permit`.
        #[derive(Debug)]
        struct Permit {
            address owner;
            address spender;
            uint256 value;
            uint256 nonce;
            uint256 deadline;
        }
    }
}

sol! {
    /// Universal-Router command inputs and faults.
    ///
    /// Each command input is `abi.encode`d as a parameter list.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IUniversalRouter {
        struct V3SwapExactOut {
            address recipient;
            uint256 amountOut;
            uint256 amountInMax;
            bytes path;
            bool payerIsUser;
        }

        struct WrapEth {
            address recipient;
            uint256 amountMin;
        }

        struct UnwrapWeth {
            address recipient;
            uint256 amountMin;
        }

        struct Transfer {
            address token;
            address recipient;
            uint256 value;
        }

        struct Sweep {
            address token;
            address recipient;
            uint256 amountMin;
        }

        error V3InvalidSwap();
        error V3TooLittleReceived();
        error V3TooMuchRequested();
        error V3InvalidAmountOut();
        error V3InvalidCaller();
        error TransactionDeadlinePassed();
        error LengthMismatch();
        error InvalidCommandType(uint256 commandType);
        error InsufficientETH();
        error InsufficientToken();
    }
}

sol! {
    /// Faults raised by the in-memory ERC-20, wrapped-native, permit and
    /// Permit2 implementations.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20Errors {
        error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
        error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
        error ERC2612ExpiredSignature(uint256 deadline);
        error ERC2612InvalidSigner(address signer, address owner);
        error SignatureExpired(uint256 signatureDeadline);
        error InvalidNonce();
        error InvalidAmount(uint256 maxAmount);
        error InvalidSigner();
        error NotWrappedNative();
        error PermitUnsupported();
        error UnknownToken(address token);
    }
}
