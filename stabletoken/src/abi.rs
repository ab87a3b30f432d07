alloy::sol! {
    /// Minimal ERC20 surface of the Celo stable tokens.
    #[sol(rpc)]
    interface IStableToken {
        function totalSupply() view returns (uint256);
        function balanceOf(address owner) view returns (uint256);
        function transfer(address to, uint256 value) returns (bool);
        function allowance(address owner, address spender) view returns (uint256);
        function approve(address spender, uint256 value) returns (bool);
        function transferFrom(address from, address to, uint256 value) returns (bool);
    }
}
