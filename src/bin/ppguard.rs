// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use ppcore::error::get_exit_code;

fn main() {
    let code = match uu_ppguard::uumain(std::env::args_os()) {
        Ok(()) => get_exit_code(),
        Err(e) => {
            let message = e.to_string();
            if !message.is_empty() {
                eprintln!("{}: {}", ppcore::util_name(), message);
            }
            if e.usage() {
                eprintln!("Try '{} --help' for more information.", ppcore::util_name());
            }
            e.code()
        }
    };
    std::process::exit(code);
}
