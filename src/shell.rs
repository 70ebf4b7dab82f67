//! Shell completion scripts. The generated scripts delegate to the binary's
//! `__complete` protocol and interpret the trailing directive line.

use crate::cmd::Cmd;

const BASH_TEMPLATE: &str = r#"# bash completion for {name}

_{name}_completions()
{
    local cur opts directive
    COMPREPLY=()
    cur="${COMP_WORDS[COMP_CWORD]}"

    # Call the binary's __complete command
    local out
    out=$({name} __complete "${COMP_WORDS[@]:1}" 2>/dev/null)
    if [ $? -ne 0 ]; then
        return
    fi

    # Parse directive from last line
    directive=$(echo "$out" | tail -n1 | tr -d ':')
    # Get candidates (everything except last line)
    opts=$(echo "$out" | sed '$d')

    # Check for error directive
    if (( directive & 1 )); then
        return
    fi

    # Generate completions (line-by-line to handle special characters)
    if [ -n "$opts" ]; then
        while IFS= read -r line; do
            if [[ "$line" == "$cur"* ]]; then
                COMPREPLY+=("$line")
            fi
        done <<< "$opts"
    fi

    # Handle file completion fallback
    if (( ! (directive & 4) )); then
        if [ ${#COMPREPLY[@]} -eq 0 ]; then
            COMPREPLY=($(compgen -f -- "$cur"))
        fi
    fi

    # Handle no-space directive
    if (( directive & 2 )); then
        compopt -o nospace
    fi
}

complete -o default -F _{name}_completions {name}
"#;

const ZSH_TEMPLATE: &str = r#"#compdef {name}

_{name}() {
    local -a completions
    local directive

    # Call the binary's __complete command
    local out
    out=$({name} __complete "${words[@]:1}" 2>/dev/null)
    if [ $? -ne 0 ]; then
        return
    fi

    # Parse directive from last line
    directive=$(echo "$out" | tail -n1 | tr -d ':')
    # Get candidates (everything except last line)
    local -a lines
    lines=("${(@f)out}")
    lines=("${lines[@]:0:$((${#lines[@]}-1))}")

    # Check for error directive
    if (( directive & 1 )); then
        return
    fi

    # Add completions
    for line in "${lines[@]}"; do
        if [ -n "$line" ]; then
            completions+=("$line")
        fi
    done

    # Offer completions with appropriate options
    local -a compadd_opts
    if (( directive & 2 )); then
        compadd_opts+=(-S '')
    fi
    compadd "${compadd_opts[@]}" -a completions

    # Handle file completion fallback
    if (( ! (directive & 4) )); then
        _files
    fi
}

compdef _{name} {name}
"#;

impl Cmd {
    /// A bash completion script for this command, suitable for sourcing or
    /// installing under `bash_completion.d`.
    pub fn bash_completion_script(&self) -> String {
        BASH_TEMPLATE.replace("{name}", &self.name)
    }

    /// A zsh completion script for this command, suitable for installing on
    /// the `fpath` as `_{name}`.
    pub fn zsh_completion_script(&self) -> String {
        ZSH_TEMPLATE.replace("{name}", &self.name)
    }
}
